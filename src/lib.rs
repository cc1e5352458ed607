//! # stegweb
//!
//! Client for a steganography web service that hides text or files inside
//! image, audio and video carriers.
//!
//! The embedding itself happens on the server. This crate is the part in
//! front of it: it validates what the user picked, posts it as a multipart
//! form to `/encode` or `/decode`, makes sense of the three response shapes
//! the service produces (JSON error, JSON text, raw file) and hands the
//! result to the user as text in a view or a downloaded file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! button press
//!  │
//!  ├─ 1. Mode      Encode or Decode, recorded in the ViewState
//!  ├─ 2. Request   validate fields, build multipart form (no I/O on failure)
//!  ├─ 3. Transport POST /encode | /decode, drain body
//!  ├─ 4. Classify  status + Content-Type + body → error | text | file
//!  └─ 5. Present   alert, show text, or download + object URL (released after 60 s)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stegweb::{
//!     ClientConfig, EncodeFields, FilePayload, Mode, SecretKind, StegClient, ViewState,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://127.0.0.1:5000")
//!         .download_dir("out")
//!         .build()?;
//!     let client = StegClient::new(config)?;
//!     let mut view = ViewState::new(Mode::Encode);
//!
//!     let fields = EncodeFields {
//!         carrier_file: Some(FilePayload::new("img.png", std::fs::read("img.png")?)),
//!         secret_kind: SecretKind::Text,
//!         secret_text: Some("hello".into()),
//!         ..Default::default()
//!     };
//!     client.encode(fields, &mut view).await?;
//!     // out/hidden_img.png now holds the carrier with the secret inside.
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `stegweb` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! stegweb = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod mode;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::StegClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{StegError, ValidationError};
pub use mode::{DownloadLink, Mode, ViewState};
pub use pipeline::input::{load_payload, FilePayload};
pub use pipeline::interpret::{classify_response, Phase, ResponseInterpreter, ServerResponse};
pub use pipeline::present::{
    DirectorySink, DownloadSink, NoopNotifier, Notifier, ObjectUrlRegistry, Presentation,
};
pub use pipeline::request::{
    build_decode_request, build_encode_request, CarrierType, DecodeFields, DecodeRequest,
    EncodeFields, EncodeRequest, SecretKind,
};
pub use pipeline::transport::RawResponse;
