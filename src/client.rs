//! Workflow entry points: one call per button press.
//!
//! [`StegClient::encode`] and [`StegClient::decode`] run the whole pipeline
//! for one submission: select the mode, validate, POST, classify, present.
//! Every failure, whatever stage it comes from, is reported to the user once
//! through the configured [`Notifier`] and returned to the caller.

use crate::config::ClientConfig;
use crate::error::{StegError, ValidationError};
use crate::mode::{Mode, ViewState};
use crate::pipeline::interpret::ResponseInterpreter;
use crate::pipeline::present::{
    DirectorySink, DownloadSink, NoopNotifier, Notifier, ObjectUrlRegistry, Presentation,
    Presenter,
};
use crate::pipeline::request::{
    build_decode_request, build_encode_request, DecodeFields, EncodeFields, Submission,
};
use crate::pipeline::transport::Transport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client for the `/encode` and `/decode` endpoints.
///
/// # Example
/// ```rust,no_run
/// use stegweb::{ClientConfig, DecodeFields, FilePayload, Mode, StegClient, ViewState};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StegClient::new(ClientConfig::default())?;
/// let mut view = ViewState::new(Mode::Decode);
/// let carrier = FilePayload::new("hidden_img.png", std::fs::read("hidden_img.png")?);
/// client
///     .decode(DecodeFields { carrier_file: Some(carrier) }, &mut view)
///     .await?;
/// if let Some(text) = view.text_result() {
///     println!("{text}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct StegClient {
    config: ClientConfig,
    transport: Transport,
    presenter: Presenter,
    in_flight: AtomicBool,
}

impl StegClient {
    /// Client that saves downloads into `config.download_dir` and reports
    /// nothing (errors are still returned).
    pub fn new(config: ClientConfig) -> Result<Self, StegError> {
        let sink = Arc::new(DirectorySink::new(config.download_dir.clone()));
        Self::with_parts(config, Arc::new(NoopNotifier), sink)
    }

    /// Client with caller-supplied notification and download adapters.
    pub fn with_parts(
        config: ClientConfig,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn DownloadSink>,
    ) -> Result<Self, StegError> {
        let transport = Transport::new(&config)?;
        let presenter = Presenter::new(
            ObjectUrlRegistry::new(),
            notifier,
            sink,
            Duration::from_secs(config.object_url_ttl_secs),
        );
        Ok(Self {
            config,
            transport,
            presenter,
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Object URLs created for file results.
    pub fn registry(&self) -> &ObjectUrlRegistry {
        self.presenter.registry()
    }

    /// Hide a secret in a carrier.
    pub async fn encode(
        &self,
        fields: EncodeFields,
        view: &mut ViewState,
    ) -> Result<Presentation, StegError> {
        let limit = self.config.max_upload_bytes;
        self.run(Mode::Encode, view, || {
            build_encode_request(fields, limit).map(Submission::from)
        })
        .await
    }

    /// Extract a secret from a carrier.
    pub async fn decode(
        &self,
        fields: DecodeFields,
        view: &mut ViewState,
    ) -> Result<Presentation, StegError> {
        let limit = self.config.max_upload_bytes;
        self.run(Mode::Decode, view, || {
            build_decode_request(fields, limit).map(Submission::from)
        })
        .await
    }

    async fn run(
        &self,
        mode: Mode,
        view: &mut ViewState,
        build: impl FnOnce() -> Result<Submission, ValidationError>,
    ) -> Result<Presentation, StegError> {
        view.select(mode);
        let result = self.run_inner(mode, view, build).await;
        if let Err(ref e) = result {
            warn!("{} failed: {}", mode, e);
            self.presenter.fail(e);
        }
        result
    }

    async fn run_inner(
        &self,
        mode: Mode,
        view: &mut ViewState,
        build: impl FnOnce() -> Result<Submission, ValidationError>,
    ) -> Result<Presentation, StegError> {
        // ── Step 1: Validate (no I/O before this passes) ─────────────────
        let submission = build()?;
        debug!("{} request fields: {:?}", mode, submission.field_names());

        // ── Step 2: Refuse overlapping submissions ───────────────────────
        let _guard = self.acquire()?;

        // ── Step 3: Send ─────────────────────────────────────────────────
        let endpoint = self.config.endpoint(mode);
        let mut interpreter = ResponseInterpreter::new(mode, submission.carrier_name());
        info!("Submitting {} of '{}'", mode, submission.carrier_name());
        let form = submission.to_form()?;
        let raw = self.transport.submit(form, &endpoint).await?;
        drop(submission);

        // ── Step 4: Classify ─────────────────────────────────────────────
        interpreter.begin()?;
        interpreter.classify(raw)?;
        let outcome = interpreter.finish()?;

        // ── Step 5: Present ──────────────────────────────────────────────
        self.presenter.present(mode, outcome, view)
    }

    fn acquire(&self) -> Result<Option<InFlightGuard<'_>>, StegError> {
        if self.config.allow_overlapping {
            return Ok(None);
        }
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Some(InFlightGuard(&self.in_flight)))
            .map_err(|_| StegError::Busy)
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
