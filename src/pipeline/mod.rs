//! Pipeline stages for one encode or decode submission.
//!
//! Each submodule implements exactly one step. Only [`transport`] performs
//! network I/O.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ request ──▶ transport ──▶ interpret ──▶ present
//! (files)   (validate)   (POST)       (classify)    (view / download)
//! ```
//!
//! 1. [`input`]:     load user-selected files into named payloads
//! 2. [`request`]:   validate the form and assemble the multipart body;
//!    nothing is sent when validation fails
//! 3. [`transport`]: the only stage with network I/O; no retries
//! 4. [`interpret`]: map status + `Content-Type` + body onto error, text or
//!    file, totally and deterministically
//! 5. [`present`]:   update the view, download files, own object URLs

pub mod input;
pub mod interpret;
pub mod present;
pub mod request;
pub mod transport;
