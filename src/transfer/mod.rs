//! Password-manager import/export: format registry, detection, per-format
//! parsers and exporters, file naming and export protection.

pub mod cipher;
pub mod csv;
pub mod detect;
pub mod entry;
pub mod error;
pub mod filename;
pub mod format;
pub mod formats;
pub mod handler;

use secrecy::{ExposeSecret, SecretString};

use crate::core::crypto::{content_digest, KdfParams};
use cipher::{encrypt_export, is_armored, open_export, ExportCipher};
use detect::detect_format;
use entry::PasswordEntry;
use error::TransferError;
use filename::{generate_file_name, FileNameOptions};
use format::Format;
use formats::keepass::KDBX_SIGNATURE;
use handler::{handler_for, ParseReport};

pub const EXPORT_MIME_TYPE: &str = "text/plain;charset=utf-8";

#[derive(Default)]
pub struct ImportOptions {
    /// Skips detection when set.
    pub format: Option<Format>,
    pub filename: Option<String>,
    /// Opens exports sealed by this tool.
    pub passphrase: Option<SecretString>,
    /// Master password of formats that declare `requires_password`.
    pub source_password: Option<SecretString>,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub format: Format,
    pub was_encrypted: bool,
    pub report: ParseReport,
}

/// Turns the raw bytes of an import file into entries.
pub fn import_bytes(bytes: &[u8], opts: &ImportOptions) -> Result<ImportOutcome, TransferError> {
    if bytes.is_empty() {
        return Err(TransferError::EmptyInput);
    }
    if bytes.starts_with(&KDBX_SIGNATURE) {
        return import_text("", Format::KeePassKdbx, false, opts);
    }

    let text = std::str::from_utf8(bytes).map_err(|_| TransferError::NotText)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if is_armored(text) {
        let passphrase = opts
            .passphrase
            .as_ref()
            .ok_or(TransferError::PassphraseRequired)?;
        let plain = open_export(text, passphrase.expose_secret())?;
        let format = resolve_format(&plain, opts)?;
        return import_text(&plain, format, true, opts);
    }

    let format = resolve_format(text, opts)?;
    import_text(text, format, false, opts)
}

fn resolve_format(text: &str, opts: &ImportOptions) -> Result<Format, TransferError> {
    match opts.format {
        Some(format) => Ok(format),
        None => detect_format(text, opts.filename.as_deref()).ok_or(TransferError::UnknownFormat),
    }
}

fn import_text(
    text: &str,
    format: Format,
    was_encrypted: bool,
    opts: &ImportOptions,
) -> Result<ImportOutcome, TransferError> {
    let meta = format.metadata();
    if !meta.supports_import {
        return Err(TransferError::Unsupported(format));
    }
    if meta.requires_password && opts.source_password.is_none() {
        return Err(TransferError::PasswordRequired(format));
    }
    let report = handler_for(format).parse(text)?;
    tracing::info!(
        %format,
        accepted = report.entries.len(),
        skipped = report.skipped_count(),
        "import parsed"
    );
    Ok(ImportOutcome {
        format,
        was_encrypted,
        report,
    })
}

pub struct ExportRequest<'a> {
    pub format: Format,
    pub cipher: ExportCipher,
    pub passphrase: Option<&'a str>,
    pub kdf: KdfParams,
    pub app_name: &'a str,
    pub username: Option<&'a str>,
    pub timestamp: Option<chrono::NaiveDateTime>,
}

impl<'a> ExportRequest<'a> {
    pub fn new(format: Format, app_name: &'a str) -> Self {
        Self {
            format,
            cipher: ExportCipher::None,
            passphrase: None,
            kdf: KdfParams::default(),
            app_name,
            username: None,
            timestamp: None,
        }
    }
}

#[derive(Debug)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content: String,
    pub mime_type: &'static str,
    pub count: usize,
    /// SHA-256 of `content`, hex.
    pub digest: String,
}

/// Serializes `entries`, protects the result as requested and names the file.
pub fn export_entries(
    entries: &[PasswordEntry],
    req: &ExportRequest<'_>,
) -> Result<ExportArtifact, TransferError> {
    if !req.format.metadata().supports_export {
        return Err(TransferError::ExportNotSupported(req.format));
    }
    let body = handler_for(req.format).export(entries)?;
    let content = match req.cipher {
        ExportCipher::None => body,
        cipher => {
            let passphrase = req.passphrase.ok_or(TransferError::PassphraseRequired)?;
            encrypt_export(&body, cipher, passphrase, req.kdf)?
        }
    };

    let naming = FileNameOptions {
        app_name: req.app_name,
        username: req.username,
        format: req.format,
        extension: None,
        encrypted: req.cipher.is_encrypted(),
        timestamp: req.timestamp,
        item_count: Some(entries.len()),
    };
    let file_name = generate_file_name(&naming);
    tracing::info!(format = %req.format, count = entries.len(), %file_name, "export ready");
    let digest = content_digest(content.as_bytes());
    Ok(ExportArtifact {
        file_name,
        digest,
        content,
        mime_type: EXPORT_MIME_TYPE,
        count: entries.len(),
    })
}
