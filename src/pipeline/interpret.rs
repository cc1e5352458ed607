//! Response interpretation: map any HTTP response onto one of three outcomes.
//!
//! The service answers with three different shapes and the only hints are the
//! status code and the `Content-Type` header:
//!
//! ```text
//!                       ┌─ not 2xx ───────────────────────▶ ErrorResult
//! Pending ─▶ Classifying┼─ 2xx, application/json ─▶ parse ─┬▶ ErrorResult (message, or unrecognised)
//!                       │                                  ├▶ TextResult  (type:"text")
//!                       │                                  └▶ FileResult  (type:"file", base64 data)
//!                       └─ 2xx, anything else ────────────▶ FileResult  (body is the file)
//! ```
//!
//! Classification is total: every (status, content type, body) triple lands
//! in exactly one terminal state, with unrecognised shapes folded into an
//! error carrying the mode's generic failure message.

use crate::error::StegError;
use crate::mode::Mode;
use crate::pipeline::input::sanitize_file_name;
use crate::pipeline::transport::RawResponse;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::debug;

/// Name a decoded file is saved under when the server gives none.
pub const EXTRACTED_FILE_NAME: &str = "extracted_file";

/// Terminal outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerResponse {
    /// The server reported a failure, or the response made no sense.
    ErrorResult { message: String },
    /// Extracted text.
    TextResult { data: String },
    /// A file to hand to the user: the encoded carrier or an extracted file.
    FileResult { blob: Vec<u8>, suggested_name: String },
}

/// Where a [`ResponseInterpreter`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Classifying,
    ErrorState,
    TextState,
    FileState,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::ErrorState | Phase::TextState | Phase::FileState)
    }
}

impl ServerResponse {
    pub fn phase(&self) -> Phase {
        match self {
            ServerResponse::ErrorResult { .. } => Phase::ErrorState,
            ServerResponse::TextResult { .. } => Phase::TextState,
            ServerResponse::FileResult { .. } => Phase::FileState,
        }
    }
}

/// JSON body of a successful-status JSON response.
///
/// `result_kind` is accepted as an explicit alternative to `type`.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: Option<bool>,
    message: Option<String>,
    #[serde(rename = "type", alias = "result_kind")]
    kind: Option<String>,
    data: Option<serde_json::Value>,
    filename: Option<String>,
}

/// Name a file result is offered under.
///
/// Encode results are `hidden_<carrier name>`; decode results are
/// [`EXTRACTED_FILE_NAME`].
pub fn suggested_file_name(mode: Mode, carrier_name: &str) -> String {
    match mode {
        Mode::Encode => format!("hidden_{}", sanitize_file_name(carrier_name)),
        Mode::Decode => EXTRACTED_FILE_NAME.to_string(),
    }
}

/// Classify a raw response. Pure and deterministic.
pub fn classify_response(mode: Mode, carrier_name: &str, raw: RawResponse) -> ServerResponse {
    let fallback = || ServerResponse::ErrorResult {
        message: mode.fallback_failure().to_string(),
    };

    if !raw.is_success() {
        let message = serde_json::from_slice::<serde_json::Value>(&raw.body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.is_empty());
        return match message {
            Some(message) => ServerResponse::ErrorResult { message },
            None => fallback(),
        };
    }

    if !is_json(raw.content_type.as_deref()) {
        return ServerResponse::FileResult {
            blob: raw.body,
            suggested_name: suggested_file_name(mode, carrier_name),
        };
    }

    let envelope: Envelope = match serde_json::from_slice(&raw.body) {
        Ok(e) => e,
        Err(e) => {
            debug!("{} response is not a recognised JSON envelope: {}", mode, e);
            return fallback();
        }
    };

    // Anything not explicitly successful that carries a message is a failure.
    let message = envelope.message.as_deref().filter(|m| !m.is_empty());
    match (envelope.success, message) {
        (Some(true), _) => {}
        (_, Some(message)) => {
            return ServerResponse::ErrorResult {
                message: message.to_string(),
            }
        }
        (Some(false), None) => return fallback(),
        (None, None) => {}
    }

    let data = envelope.data.as_ref().and_then(|d| d.as_str());
    match (envelope.kind.as_deref(), data) {
        (Some("text"), Some(text)) => ServerResponse::TextResult {
            data: text.to_string(),
        },
        (Some("file"), Some(encoded)) => match STANDARD.decode(encoded) {
            Ok(blob) => ServerResponse::FileResult {
                blob,
                suggested_name: envelope
                    .filename
                    .as_deref()
                    .filter(|name| has_usable_name(name))
                    .map(sanitize_file_name)
                    .unwrap_or_else(|| suggested_file_name(mode, carrier_name)),
            },
            Err(e) => {
                debug!("{} file envelope carries invalid base64: {}", mode, e);
                fallback()
            }
        },
        _ => fallback(),
    }
}

/// True when the last path component of `name` is more than dots and blanks.
fn has_usable_name(name: &str) -> bool {
    name.rsplit(['/', '\\'])
        .next()
        .map(|base| base.chars().any(|c| c != '.' && !c.is_whitespace()))
        .unwrap_or(false)
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// Stateful wrapper around [`classify_response`] that enforces
/// `Pending → Classifying → terminal`.
#[derive(Debug)]
pub struct ResponseInterpreter {
    mode: Mode,
    carrier_name: String,
    state: State,
}

#[derive(Debug)]
enum State {
    Pending,
    Classifying,
    Done(ServerResponse),
}

impl ResponseInterpreter {
    pub fn new(mode: Mode, carrier_name: impl Into<String>) -> Self {
        Self {
            mode,
            carrier_name: carrier_name.into(),
            state: State::Pending,
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.state {
            State::Pending => Phase::Pending,
            State::Classifying => Phase::Classifying,
            State::Done(r) => r.phase(),
        }
    }

    /// A response arrived; start classifying it.
    pub fn begin(&mut self) -> Result<(), StegError> {
        match self.state {
            State::Pending => {
                self.state = State::Classifying;
                Ok(())
            }
            _ => Err(self.illegal("begin")),
        }
    }

    /// Classify `raw` and move to the matching terminal state.
    pub fn classify(&mut self, raw: RawResponse) -> Result<Phase, StegError> {
        if !matches!(self.state, State::Classifying) {
            return Err(self.illegal("classify"));
        }
        let outcome = classify_response(self.mode, &self.carrier_name, raw);
        debug!("{} response classified as {:?}", self.mode, outcome.phase());
        self.state = State::Done(outcome);
        Ok(self.phase())
    }

    /// Take the terminal outcome.
    pub fn finish(self) -> Result<ServerResponse, StegError> {
        match self.state {
            State::Done(outcome) => Ok(outcome),
            _ => Err(StegError::Internal(format!(
                "response interpreter finished in {:?}",
                self.phase()
            ))),
        }
    }

    fn illegal(&self, op: &str) -> StegError {
        StegError::Internal(format!(
            "response interpreter cannot {op} from {:?}",
            self.phase()
        ))
    }
}
