//! Mode selection and the explicit view state the workflow writes into.
//!
//! The view state replaces what would otherwise be global UI lookups: the
//! presenter receives `&mut ViewState` and updates the text-result and
//! file-result regions there.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two mutually exclusive workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Hide a secret inside a carrier file.
    #[default]
    Encode,
    /// Extract a secret from a carrier file.
    Decode,
}

impl Mode {
    /// Message shown when the server fails without a usable explanation.
    pub fn fallback_failure(self) -> &'static str {
        match self {
            Mode::Encode => "Encode failed",
            Mode::Decode => "Decode failed",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Encode => f.write_str("encode"),
            Mode::Decode => f.write_str("decode"),
        }
    }
}

/// A populated download link in the file-result region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    /// Object URL the link points at.
    pub url: String,
    /// Name the file is saved under.
    pub file_name: String,
    /// Link text.
    pub label: String,
}

/// Everything the result regions currently show.
///
/// A region is visible exactly when it holds a value. Concurrent workflows
/// writing into the same view overwrite each other: last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    mode: Mode,
    text_result: Option<String>,
    file_result: Option<DownloadLink>,
}

impl ViewState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Switch the active workflow. Result regions are left as they are.
    pub fn select(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn text_result(&self) -> Option<&str> {
        self.text_result.as_deref()
    }

    pub fn file_result(&self) -> Option<&DownloadLink> {
        self.file_result.as_ref()
    }

    pub fn is_text_visible(&self) -> bool {
        self.text_result.is_some()
    }

    pub fn is_file_visible(&self) -> bool {
        self.file_result.is_some()
    }

    /// Show extracted text and hide the file region.
    pub(crate) fn show_text(&mut self, data: String) {
        self.text_result = Some(data);
        self.file_result = None;
    }

    /// Show a download link and hide the text region.
    pub(crate) fn show_file(&mut self, link: DownloadLink) {
        self.file_result = Some(link);
        self.text_result = None;
    }
}
