//! Request building: validate user fields and assemble multipart forms.
//!
//! Validation runs in a fixed order and the first failure wins:
//!
//! 1. carrier file present
//! 2. (encode) the secret matching the declared kind is present
//! 3. the whole upload fits under the size limit
//!
//! Nothing here touches the network. A built request is a plain value that
//! [`crate::pipeline::transport`] turns into a POST.

use crate::error::{StegError, ValidationError};
use crate::mode::Mode;
use crate::pipeline::input::FilePayload;
use mime_guess::Mime;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::fmt;

const OCTET_STREAM: &str = "application/octet-stream";

// ── Wire field names ─────────────────────────────────────────────────────

pub const FIELD_CARRIER_TYPE: &str = "carrier_type";
pub const FIELD_CARRIER_FILE: &str = "carrier_file";
pub const FIELD_SECRET_TYPE: &str = "secret_type";
pub const FIELD_SECRET_TEXT: &str = "secret_text";
pub const FIELD_SECRET_FILE: &str = "secret_file";

// ── Enums ────────────────────────────────────────────────────────────────

/// Kind of carrier the secret is embedded into.
///
/// The service dispatches on a fixed label per kind; see [`CarrierType::wire_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarrierType {
    #[default]
    Image,
    Audio,
    Video,
}

impl CarrierType {
    /// Value sent in the `carrier_type` field.
    pub fn wire_label(self) -> &'static str {
        match self {
            CarrierType::Image => "图片",
            CarrierType::Audio => "音频",
            CarrierType::Video => "视频",
        }
    }
}

impl fmt::Display for CarrierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarrierType::Image => f.write_str("image"),
            CarrierType::Audio => f.write_str("audio"),
            CarrierType::Video => f.write_str("video"),
        }
    }
}

/// Whether the secret is a piece of text or a whole file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretKind {
    #[default]
    Text,
    File,
}

impl SecretKind {
    /// Value sent in the `secret_type` field.
    pub fn wire_label(self) -> &'static str {
        match self {
            SecretKind::Text => "文本",
            SecretKind::File => "文件",
        }
    }
}

// ── Raw form fields ──────────────────────────────────────────────────────

/// Encode form as the user filled it in; any field may be missing.
#[derive(Debug, Clone, Default)]
pub struct EncodeFields {
    pub carrier_type: CarrierType,
    pub carrier_file: Option<FilePayload>,
    pub secret_kind: SecretKind,
    pub secret_text: Option<String>,
    pub secret_file: Option<FilePayload>,
}

/// Decode form as the user filled it in.
#[derive(Debug, Clone, Default)]
pub struct DecodeFields {
    pub carrier_file: Option<FilePayload>,
}

// ── Validated requests ───────────────────────────────────────────────────

/// The secret half of an encode request. Exactly one variant exists per
/// request, so "text and file both set" cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Secret {
    Text(String),
    File(FilePayload),
}

impl Secret {
    pub fn kind(&self) -> SecretKind {
        match self {
            Secret::Text(_) => SecretKind::Text,
            Secret::File(_) => SecretKind::File,
        }
    }

    fn len(&self) -> usize {
        match self {
            Secret::Text(t) => t.len(),
            Secret::File(f) => f.len(),
        }
    }
}

/// A validated `/encode` submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub carrier_type: CarrierType,
    pub carrier_file: FilePayload,
    pub secret: Secret,
}

/// A validated `/decode` submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    pub carrier_file: FilePayload,
}

/// Either kind of validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Encode(EncodeRequest),
    Decode(DecodeRequest),
}

impl Submission {
    pub fn mode(&self) -> Mode {
        match self {
            Submission::Encode(_) => Mode::Encode,
            Submission::Decode(_) => Mode::Decode,
        }
    }

    /// Name of the carrier file as the user selected it.
    pub fn carrier_name(&self) -> &str {
        match self {
            Submission::Encode(r) => &r.carrier_file.name,
            Submission::Decode(r) => &r.carrier_file.name,
        }
    }

    /// Multipart field names in the order they are appended.
    pub fn field_names(&self) -> Vec<&'static str> {
        match self {
            Submission::Encode(r) => r.field_names(),
            Submission::Decode(r) => r.field_names(),
        }
    }

    /// Build the multipart body.
    pub fn to_form(&self) -> Result<Form, StegError> {
        match self {
            Submission::Encode(r) => r.to_form(),
            Submission::Decode(r) => r.to_form(),
        }
    }
}

impl From<EncodeRequest> for Submission {
    fn from(r: EncodeRequest) -> Self {
        Submission::Encode(r)
    }
}

impl From<DecodeRequest> for Submission {
    fn from(r: DecodeRequest) -> Self {
        Submission::Decode(r)
    }
}

impl EncodeRequest {
    pub fn field_names(&self) -> Vec<&'static str> {
        let secret_field = match self.secret {
            Secret::Text(_) => FIELD_SECRET_TEXT,
            Secret::File(_) => FIELD_SECRET_FILE,
        };
        vec![
            FIELD_CARRIER_TYPE,
            FIELD_CARRIER_FILE,
            FIELD_SECRET_TYPE,
            secret_field,
        ]
    }

    pub fn to_form(&self) -> Result<Form, StegError> {
        let form = Form::new()
            .text(FIELD_CARRIER_TYPE, self.carrier_type.wire_label())
            .part(FIELD_CARRIER_FILE, file_part(&self.carrier_file)?)
            .text(FIELD_SECRET_TYPE, self.secret.kind().wire_label());
        Ok(match &self.secret {
            Secret::Text(text) => form.text(FIELD_SECRET_TEXT, text.clone()),
            Secret::File(file) => form.part(FIELD_SECRET_FILE, file_part(file)?),
        })
    }

    fn upload_size(&self) -> usize {
        self.carrier_file.len() + self.secret.len()
    }
}

impl DecodeRequest {
    pub fn field_names(&self) -> Vec<&'static str> {
        vec![FIELD_CARRIER_FILE]
    }

    pub fn to_form(&self) -> Result<Form, StegError> {
        Ok(Form::new().part(FIELD_CARRIER_FILE, file_part(&self.carrier_file)?))
    }
}

fn file_part(file: &FilePayload) -> Result<Part, StegError> {
    // Unparsable MIME strings are sent as octet-stream instead.
    let mime = match file.mime.parse::<Mime>() {
        Ok(_) => file.mime.as_str(),
        Err(_) => OCTET_STREAM,
    };
    Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str(mime)
        .map_err(|e| StegError::Internal(format!("multipart part for '{}': {e}", file.name)))
}

// ── Builders ─────────────────────────────────────────────────────────────

/// Validate encode fields and produce a request.
///
/// Only the secret matching `secret_kind` is kept; the other one is
/// ignored even if the user filled it in earlier.
pub fn build_encode_request(
    fields: EncodeFields,
    max_upload_bytes: usize,
) -> Result<EncodeRequest, ValidationError> {
    let carrier_file = fields
        .carrier_file
        .ok_or(ValidationError::MissingCarrierFile)?;

    let secret = match fields.secret_kind {
        SecretKind::Text => match fields.secret_text {
            Some(text) if !text.is_empty() => Secret::Text(text),
            _ => return Err(ValidationError::MissingSecretText),
        },
        SecretKind::File => Secret::File(
            fields
                .secret_file
                .ok_or(ValidationError::MissingSecretFile)?,
        ),
    };

    let request = EncodeRequest {
        carrier_type: fields.carrier_type,
        carrier_file,
        secret,
    };
    check_size(request.upload_size(), max_upload_bytes)?;
    Ok(request)
}

/// Validate decode fields and produce a request.
pub fn build_decode_request(
    fields: DecodeFields,
    max_upload_bytes: usize,
) -> Result<DecodeRequest, ValidationError> {
    let carrier_file = fields
        .carrier_file
        .ok_or(ValidationError::MissingCarrierFile)?;
    check_size(carrier_file.len(), max_upload_bytes)?;
    Ok(DecodeRequest { carrier_file })
}

fn check_size(size: usize, limit: usize) -> Result<(), ValidationError> {
    if size > limit {
        return Err(ValidationError::PayloadTooLarge { size, limit });
    }
    Ok(())
}
