use crate::core::ports::{ByteStore, EntryCodec, PasswordSource};
use crate::transfer::entry::PasswordEntry;
use crate::transfer::formats::native::{decode_document, encode_document};
use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const PASSWORD_ENV: &str = "PASSERELLE_PASSWORD";

// ===== Codec (native JSON document) =====
pub struct JsonCodec;

impl EntryCodec for JsonCodec {
    fn encode(&self, entries: &[PasswordEntry]) -> Result<Vec<u8>> {
        Ok(encode_document(entries)?.into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<PasswordEntry>> {
        let s = std::str::from_utf8(data).map_err(|_| anyhow!("store content is not valid UTF-8"))?;
        let report = decode_document(s).context("Failed to parse store content")?;
        if !report.skipped.is_empty() {
            tracing::warn!(skipped = report.skipped.len(), "store held invalid entries");
        }
        Ok(report.entries)
    }
}

// ===== File ByteStore =====
pub struct FileByteStore {
    path: PathBuf,
    backups: usize,
}

impl FileByteStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, backups: 2 }
    }

    pub fn new_with_backups(path: PathBuf, backups: usize) -> Self {
        Self { path, backups }
    }
}

impl ByteStore for FileByteStore {
    fn read(&self) -> Result<Vec<u8>> {
        let path = &self.path;
        if !Path::new(path).exists() {
            return Ok(Vec::new());
        }
        let mut f = File::open(path).context("Failed to open store file")?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        crate::core::fs_secure::write_with_backups(&self.path, bytes, self.backups)
    }
}

// ===== Master password: env var, else prompt once per process =====
#[derive(Default)]
pub struct EnvOrPromptPassword {
    resolved: Mutex<Option<SecretString>>,
}

impl EnvOrPromptPassword {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordSource for EnvOrPromptPassword {
    fn master_password(&self) -> Result<SecretString> {
        let mut slot = self
            .resolved
            .lock()
            .map_err(|_| anyhow!("password cache poisoned"))?;
        if let Some(pw) = slot.as_ref() {
            return Ok(SecretString::from(pw.expose_secret().to_string()));
        }
        let pw = match env::var(PASSWORD_ENV) {
            Ok(pw) => pw,
            Err(_) => inquire::Password::new("Mot de passe maître")
                .without_confirmation()
                .prompt()
                .context("Failed to read master password")?,
        };
        *slot = Some(SecretString::from(pw.clone()));
        Ok(SecretString::from(pw))
    }
}

/// Fixed password, for tests and non-interactive callers.
pub struct StaticPassword(pub SecretString);

impl PasswordSource for StaticPassword {
    fn master_password(&self) -> Result<SecretString> {
        Ok(SecretString::from(self.0.expose_secret().to_string()))
    }
}
