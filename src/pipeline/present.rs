//! Result presentation: show text, offer files, report failures.
//!
//! The presenter is the only stage with side effects on the user's side:
//!
//! * **Errors** go to a [`Notifier`] exactly once, synchronously, and nothing
//!   in the view changes.
//! * **Text** is written into the view's text region; the file region is
//!   hidden.
//! * **Files** are registered under an object URL, downloaded straight away
//!   through a [`DownloadSink`] and then linked from the view's file region.
//!   The URL is released after a fixed delay; the link works until then.

use crate::error::StegError;
use crate::mode::{DownloadLink, Mode, ViewState};
use crate::pipeline::interpret::ServerResponse;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

// ── Notifications ────────────────────────────────────────────────────────

/// Blocking, user-facing notification channel.
///
/// Methods return once the user has been told; implementations decide what
/// "told" means (a dialog, a line on stderr, a recorded message in a test).
pub trait Notifier: Send + Sync {
    /// A workflow failed.
    fn alert(&self, message: &str);

    /// A workflow finished with nothing else to show. Defaults to [`Notifier::alert`].
    fn inform(&self, message: &str) {
        self.alert(message);
    }
}

/// Discards every notification.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn alert(&self, _message: &str) {}
}

// ── Object URLs ──────────────────────────────────────────────────────────

/// Process-local table of blobs addressable by `blob:` URLs.
///
/// Cloning shares the table. A URL resolves from [`ObjectUrlRegistry::create`]
/// until its first [`ObjectUrlRegistry::revoke`]; later revocations are
/// no-ops that return `false`.
#[derive(Clone, Default)]
pub struct ObjectUrlRegistry {
    blobs: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
    released: Arc<AtomicUsize>,
}

impl std::fmt::Debug for ObjectUrlRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectUrlRegistry")
            .field("live", &self.live_count())
            .field("released", &self.released_count())
            .finish()
    }
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `blob` and return a fresh URL for it.
    pub fn create(&self, blob: Vec<u8>) -> String {
        let url = format!("blob:stegweb/{}", uuid::Uuid::new_v4());
        self.lock().insert(url.clone(), Arc::new(blob));
        debug!("Created object URL {}", url);
        url
    }

    /// Dereference a URL; `None` once it has been released.
    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.lock().get(url).cloned()
    }

    /// Release a URL. Returns `true` only for the call that released it.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.lock().remove(url).is_some();
        if removed {
            self.released.fetch_add(1, Ordering::SeqCst);
            debug!("Released object URL {}", url);
        }
        removed
    }

    /// URLs still resolvable.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// URLs released so far.
    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Release `url` after `delay` on a background task.
    ///
    /// The release is not cancellable; it happens even if the caller moves
    /// on or drops the handle.
    pub fn schedule_release(&self, url: String, delay: Duration) -> JoinHandle<bool> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.revoke(&url)
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Vec<u8>>>> {
        // Every critical section is a single map operation; poison is harmless.
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ── Downloads ────────────────────────────────────────────────────────────

/// Where auto-initiated downloads end up.
pub trait DownloadSink: Send + Sync {
    /// Save `bytes` under (a variant of) `file_name`. Returns where the file
    /// landed, or `None` for sinks that do not persist anything.
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<Option<PathBuf>, StegError>;
}

/// Writes downloads into a directory, never overwriting existing files.
///
/// A clash gets a numeric suffix the way browsers do it:
/// `hidden_img.png` → `hidden_img (1).png`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<Option<PathBuf>, StegError> {
        let target = unique_path(&self.dir, file_name);
        let write_err = |source| StegError::DownloadWriteFailed {
            path: target.clone(),
            source,
        };

        // Write next to the target and rename, so a crash never leaves a
        // truncated file under the final name.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.persist_noclobber(&target)
            .map_err(|e| write_err(e.error))?;

        info!("Saved {} ({} bytes)", target.display(), bytes.len());
        Ok(Some(target))
    }
}

/// Pick `dir/name`, or the first free `dir/stem (n).ext`.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    (1..)
        .map(|n| match &ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

// ── Presenter ────────────────────────────────────────────────────────────

/// What the user ended up seeing for a successful workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Presentation {
    /// Extracted text shown in the text region.
    Text { data: String },
    /// A file linked from the file region and downloaded.
    File {
        url: String,
        file_name: String,
        size: usize,
        saved_to: Option<PathBuf>,
    },
}

/// Applies a classified outcome to the view.
pub struct Presenter {
    registry: ObjectUrlRegistry,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn DownloadSink>,
    url_ttl: Duration,
}

impl Presenter {
    pub fn new(
        registry: ObjectUrlRegistry,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn DownloadSink>,
        url_ttl: Duration,
    ) -> Self {
        Self {
            registry,
            notifier,
            sink,
            url_ttl,
        }
    }

    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    /// Apply `outcome` to `view`.
    ///
    /// An `ErrorResult` leaves `view` untouched and comes back as
    /// [`StegError::Server`]; the caller reports it through [`Presenter::fail`].
    /// Must run inside a tokio runtime (file results schedule a release task).
    pub fn present(
        &self,
        mode: Mode,
        outcome: ServerResponse,
        view: &mut ViewState,
    ) -> Result<Presentation, StegError> {
        match outcome {
            ServerResponse::ErrorResult { message } => Err(StegError::Server { message }),
            ServerResponse::TextResult { data } => {
                view.show_text(data.clone());
                Ok(Presentation::Text { data })
            }
            ServerResponse::FileResult {
                blob,
                suggested_name,
            } => self.present_file(mode, blob, suggested_name, view),
        }
    }

    /// Tell the user a workflow failed. Called once per failed workflow.
    pub fn fail(&self, err: &StegError) {
        self.notifier.alert(&err.to_string());
    }

    fn present_file(
        &self,
        mode: Mode,
        blob: Vec<u8>,
        file_name: String,
        view: &mut ViewState,
    ) -> Result<Presentation, StegError> {
        let size = blob.len();
        let url = self.registry.create(blob);

        // Auto-download goes through the URL, exactly like following the link.
        let bytes = self
            .registry
            .resolve(&url)
            .ok_or_else(|| StegError::Internal(format!("object URL {url} vanished")))?;
        let saved_to = match self.sink.download(&file_name, &bytes) {
            Ok(saved_to) => saved_to,
            Err(e) => {
                // The link was never shown, so nothing can still be using it.
                self.registry.revoke(&url);
                return Err(e);
            }
        };

        view.show_file(DownloadLink {
            url: url.clone(),
            file_name: file_name.clone(),
            label: match mode {
                Mode::Encode => "Click to download the encoded file".to_string(),
                Mode::Decode => "Click to download the extracted file".to_string(),
            },
        });

        // Release later, never now: the link above must stay usable.
        let _release = self.registry.schedule_release(url.clone(), self.url_ttl);

        if mode == Mode::Encode {
            self.notifier
                .inform("Encoding succeeded, the file has been downloaded");
        }

        Ok(Presentation::File {
            url,
            file_name,
            size,
            saved_to,
        })
    }
}
