//! End-to-end workflow tests against a mock steganography server.
//!
//! Each test starts a `wiremock` server that plays the role of the real
//! service's `/encode` and `/decode` endpoints, drives a [`StegClient`]
//! through a full button press, and checks what the user would see: the
//! view regions, the downloaded files and the notifications.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stegweb::{
    ClientConfig, DecodeFields, DirectorySink, EncodeFields, FilePayload, Mode, Notifier,
    Presentation, SecretKind, StegClient, StegError, ValidationError, ViewState,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Records every notification.
#[derive(Default)]
struct Recorder {
    alerts: Mutex<Vec<String>>,
    infos: Mutex<Vec<String>>,
}

impl Notifier for Recorder {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn inform(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }
}

impl Recorder {
    fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }
}

struct Harness {
    server: MockServer,
    client: StegClient,
    notes: Arc<Recorder>,
    downloads: TempDir,
}

async fn harness() -> Harness {
    harness_with(|b| b).await
}

async fn harness_with(
    tweak: impl FnOnce(stegweb::ClientConfigBuilder) -> stegweb::ClientConfigBuilder,
) -> Harness {
    let server = MockServer::start().await;
    let downloads = tempfile::tempdir().expect("tempdir");
    let config = tweak(
        ClientConfig::builder()
            .base_url(server.uri())
            .download_dir(downloads.path()),
    )
    .build()
    .expect("valid config");
    let notes = Arc::new(Recorder::default());
    let client = StegClient::with_parts(
        config,
        notes.clone(),
        Arc::new(DirectorySink::new(downloads.path())),
    )
    .expect("client");
    Harness {
        server,
        client,
        notes,
        downloads,
    }
}

fn png(name: &str) -> FilePayload {
    FilePayload::new(name, b"\x89PNG\r\n\x1a\nfake-image-data".to_vec())
}

fn text_encode(carrier: FilePayload, text: &str) -> EncodeFields {
    EncodeFields {
        carrier_file: Some(carrier),
        secret_kind: SecretKind::Text,
        secret_text: Some(text.to_string()),
        ..Default::default()
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn encode_then_decode_round_trip() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/encode"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"stego-png".to_vec(), "image/png"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/decode"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success":true,"type":"text","data":"hello"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&h.server)
        .await;

    // Encode.
    let mut view = ViewState::new(Mode::Encode);
    let shown = h
        .client
        .encode(text_encode(png("img.png"), "hello"), &mut view)
        .await
        .expect("encode succeeds");

    let Presentation::File { file_name, saved_to, url, .. } = shown else {
        panic!("encode must produce a file");
    };
    assert_eq!(file_name, "hidden_img.png");
    let saved = saved_to.expect("directory sink saves the file");
    assert_eq!(saved, h.downloads.path().join("hidden_img.png"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"stego-png");
    assert_eq!(view.file_result().map(|l| l.url.as_str()), Some(url.as_str()));
    assert!(h.client.registry().resolve(&url).is_some());
    assert_eq!(h.notes.alerts(), Vec::<String>::new());
    assert_eq!(h.notes.infos().len(), 1);

    // Decode the file that was just downloaded.
    let carrier = stegweb::load_payload(&saved).await.unwrap();
    let shown = h
        .client
        .decode(
            DecodeFields {
                carrier_file: Some(carrier),
            },
            &mut view,
        )
        .await
        .expect("decode succeeds");

    assert_eq!(shown, Presentation::Text { data: "hello".into() });
    assert_eq!(view.mode(), Mode::Decode);
    assert_eq!(view.text_result(), Some("hello"));
    assert!(!view.is_file_visible());
}

#[tokio::test]
async fn encode_sends_exact_wire_fields() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/encode"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "image/png"))
        .mount(&h.server)
        .await;

    let mut view = ViewState::default();
    h.client
        .encode(text_encode(png("img.png"), "hello"), &mut view)
        .await
        .unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = &requests[0].body;
    for field in ["carrier_type", "carrier_file", "secret_type", "secret_text"] {
        assert!(
            contains(body, format!("name=\"{field}\"").as_bytes()),
            "missing field {field}"
        );
    }
    assert!(!contains(body, b"name=\"secret_file\""));
    assert!(contains(body, "图片".as_bytes()));
    assert!(contains(body, "文本".as_bytes()));
    assert!(contains(body, b"filename=\"img.png\""));
    assert!(contains(body, b"hello"));
}

#[tokio::test]
async fn encode_file_secret_sends_secret_file() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/encode"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "audio/wav"))
        .mount(&h.server)
        .await;

    let fields = EncodeFields {
        carrier_type: stegweb::CarrierType::Audio,
        carrier_file: Some(FilePayload::new("song.wav", b"RIFF....".to_vec())),
        secret_kind: SecretKind::File,
        secret_text: None,
        secret_file: Some(FilePayload::new("notes.txt", b"top secret".to_vec())),
    };
    let mut view = ViewState::default();
    h.client.encode(fields, &mut view).await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    let body = &requests[0].body;
    assert!(contains(body, b"name=\"secret_file\""));
    assert!(contains(body, b"filename=\"notes.txt\""));
    assert!(!contains(body, b"name=\"secret_text\""));
    assert!(contains(body, "音频".as_bytes()));
    assert!(contains(body, "文件".as_bytes()));
    assert_eq!(files_in(h.downloads.path()), vec!["hidden_song.wav"]);
}

#[tokio::test]
async fn decode_without_hidden_data_shows_server_message() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/decode"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success":false,"message":"no hidden data found"}"#,
            "application/json",
        ))
        .mount(&h.server)
        .await;

    let mut view = ViewState::new(Mode::Decode);
    let err = h
        .client
        .decode(
            DecodeFields {
                carrier_file: Some(png("plain.png")),
            },
            &mut view,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StegError::Server { .. }));
    assert_eq!(h.notes.alerts(), vec!["no hidden data found"]);
    assert!(files_in(h.downloads.path()).is_empty(), "no download");
    assert!(!view.is_text_visible() && !view.is_file_visible());
    assert_eq!(h.client.registry().live_count(), 0);
}

#[tokio::test]
async fn server_crash_shows_generic_message() {
    let h = harness().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_raw(
            "<html><pre>Traceback (most recent call last): ...</pre></html>",
            "text/html",
        ))
        .mount(&h.server)
        .await;

    let mut view = ViewState::default();
    h.client
        .decode(
            DecodeFields {
                carrier_file: Some(png("img.png")),
            },
            &mut view,
        )
        .await
        .unwrap_err();
    h.client
        .encode(text_encode(png("img.png"), "hi"), &mut view)
        .await
        .unwrap_err();

    assert_eq!(h.notes.alerts(), vec!["Decode failed", "Encode failed"]);
}

#[tokio::test]
async fn http_error_with_json_message() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/encode"))
        .respond_with(
            ResponseTemplate::new(413).set_body_json(serde_json::json!({
                "message": "carrier too large"
            })),
        )
        .mount(&h.server)
        .await;

    let mut view = ViewState::default();
    let err = h
        .client
        .encode(text_encode(png("big.png"), "x"), &mut view)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "carrier too large");
    assert_eq!(h.notes.alerts(), vec!["carrier too large"]);
}

#[tokio::test]
async fn missing_fields_never_reach_the_server() {
    let h = harness().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut view = ViewState::default();

    let err = h
        .client
        .encode(
            EncodeFields {
                carrier_file: None,
                ..text_encode(png("img.png"), "hello")
            },
            &mut view,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StegError::Validation(ValidationError::MissingCarrierFile)
    ));

    let err = h
        .client
        .encode(text_encode(png("img.png"), ""), &mut view)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StegError::Validation(ValidationError::MissingSecretText)
    ));

    let err = h
        .client
        .encode(
            EncodeFields {
                carrier_file: Some(png("img.png")),
                secret_kind: SecretKind::File,
                ..Default::default()
            },
            &mut view,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StegError::Validation(ValidationError::MissingSecretFile)
    ));

    assert_eq!(
        h.notes.alerts(),
        vec![
            "Please select a carrier file",
            "Please enter the text to hide",
            "Please select the file to hide",
        ]
    );
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_upload_is_refused_locally() {
    let h = harness_with(|b| b.max_upload_bytes(8)).await;
    let mut view = ViewState::default();
    let err = h
        .client
        .decode(
            DecodeFields {
                carrier_file: Some(png("img.png")),
            },
            &mut view,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StegError::Validation(ValidationError::PayloadTooLarge { limit: 8, .. })
    ));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn decode_raw_body_is_extracted_file() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/decode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-1.7 secret".to_vec(), "application/octet-stream"),
        )
        .mount(&h.server)
        .await;

    let mut view = ViewState::new(Mode::Decode);
    let shown = h
        .client
        .decode(
            DecodeFields {
                carrier_file: Some(png("hidden_img.png")),
            },
            &mut view,
        )
        .await
        .unwrap();

    let Presentation::File { file_name, url, .. } = shown else {
        panic!("expected a file");
    };
    assert_eq!(file_name, "extracted_file");
    assert_eq!(
        std::fs::read(h.downloads.path().join("extracted_file")).unwrap(),
        b"%PDF-1.7 secret"
    );
    let link = view.file_result().unwrap();
    assert_eq!(link.url, url);
    assert!(!view.is_text_visible());
    // Decode results are not announced; the link is the feedback.
    assert!(h.notes.infos().is_empty());
    // Still resolvable: release happens after the TTL, not now.
    assert!(h.client.registry().resolve(&url).is_some());
    assert_eq!(h.client.registry().released_count(), 0);
}

#[tokio::test]
async fn decode_base64_file_envelope() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/decode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "type": "file",
            "data": "c2VjcmV0",
            "filename": "plan.txt"
        })))
        .mount(&h.server)
        .await;

    let mut view = ViewState::new(Mode::Decode);
    h.client
        .decode(
            DecodeFields {
                carrier_file: Some(png("hidden_img.png")),
            },
            &mut view,
        )
        .await
        .unwrap();

    assert_eq!(files_in(h.downloads.path()), vec!["plan.txt"]);
    assert_eq!(
        std::fs::read(h.downloads.path().join("plan.txt")).unwrap(),
        b"secret"
    );
}

#[tokio::test]
async fn overlapping_submission_is_refused() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/decode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"{"success":true,"type":"text","data":"slow"}"#,
                    "application/json",
                )
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&h.server)
        .await;

    let mut first_view = ViewState::default();
    let mut second_view = ViewState::default();
    let fields = || DecodeFields {
        carrier_file: Some(png("img.png")),
    };

    let second = async {
        // Let the first request get in flight.
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.client.decode(fields(), &mut second_view).await
    };
    let (first, second) = tokio::join!(h.client.decode(fields(), &mut first_view), second);

    assert_eq!(first.unwrap(), Presentation::Text { data: "slow".into() });
    assert!(matches!(second, Err(StegError::Busy)));
    assert_eq!(first_view.text_result(), Some("slow"));
    assert!(!second_view.is_text_visible());
    assert_eq!(h.server.received_requests().await.unwrap().len(), 1);

    // The guard is released once the first submission finished.
    let mut view = ViewState::default();
    assert!(h.client.decode(fields(), &mut view).await.is_ok());
}

#[tokio::test]
async fn overlapping_allowed_when_configured() {
    let h = harness_with(|b| b.allow_overlapping(true)).await;
    Mock::given(method("POST"))
        .and(path("/decode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"{"success":true,"type":"text","data":"ok"}"#,
                    "application/json",
                )
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&h.server)
        .await;

    let mut a = ViewState::default();
    let mut b = ViewState::default();
    let fields = || DecodeFields {
        carrier_file: Some(png("img.png")),
    };
    let (ra, rb) = tokio::join!(
        h.client.decode(fields(), &mut a),
        h.client.decode(fields(), &mut b)
    );
    assert!(ra.is_ok() && rb.is_ok());
    assert_eq!(h.server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let h = harness_with(|b| b.base_url("http://127.0.0.1:1")).await;
    let mut view = ViewState::default();
    let err = h
        .client
        .decode(
            DecodeFields {
                carrier_file: Some(png("img.png")),
            },
            &mut view,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StegError::Transport { .. }), "got: {err:?}");
    assert_eq!(h.notes.alerts().len(), 1);
}
