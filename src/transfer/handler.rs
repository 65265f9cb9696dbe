use serde::Serialize;
use std::fmt;

use super::entry::PasswordEntry;
use super::error::TransferError;
use super::format::Format;
use super::formats::{bitwarden, chrome, dashlane, keepass, lastpass, native, onepassword};

/// Reader and writer for one file layout. Implementations are stateless.
pub trait FormatHandler: Send + Sync {
    fn format(&self) -> Format;

    /// How specifically `content` matches this layout; `None` when it does
    /// not match at all. Must never panic.
    fn confidence(&self, content: &str) -> Option<u32>;

    fn validate(&self, content: &str) -> bool {
        self.confidence(content).is_some()
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError>;

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError>;
}

pub fn handler_for(format: Format) -> &'static dyn FormatHandler {
    match format {
        Format::BitwardenJson => &bitwarden::BitwardenJson,
        Format::BitwardenCsv => &bitwarden::BitwardenCsv,
        Format::OnePassword1pif => &onepassword::OnePassword1pif,
        Format::OnePasswordCsv => &onepassword::OnePasswordCsv,
        Format::LastPassCsv => &lastpass::LastPassCsv,
        Format::KeePassCsv => &keepass::KeePassCsv,
        Format::KeePassKdbx => &keepass::KeePassKdbx,
        Format::ChromeCsv => &chrome::ChromeCsv,
        Format::DashlaneCsv => &dashlane::DashlaneCsv,
        Format::DashlaneJson => &dashlane::DashlaneJson,
        Format::Native => &native::NativeJson,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum SkipReason {
    NotALogin,
    MissingSiteName,
    MissingPassword,
    Malformed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotALogin => f.write_str("not a login item"),
            SkipReason::MissingSiteName => f.write_str("missing site name"),
            SkipReason::MissingPassword => f.write_str("missing password"),
            SkipReason::Malformed(detail) => write!(f, "malformed record: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// 1-based position of the record among the data records.
    pub record: usize,
    pub reason: SkipReason,
}

/// Outcome of a parse: accepted entries plus what was left out and why.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub entries: Vec<PasswordEntry>,
    pub skipped: Vec<SkippedRecord>,
}

impl ParseReport {
    /// Accepts `entry` when it is importable, otherwise records the reason.
    pub fn push(&mut self, record: usize, entry: PasswordEntry) {
        if entry.site_name.trim().is_empty() {
            self.skip(record, SkipReason::MissingSiteName);
        } else if entry.password_str().is_empty() {
            self.skip(record, SkipReason::MissingPassword);
        } else {
            self.entries.push(entry);
        }
    }

    pub fn skip(&mut self, record: usize, reason: SkipReason) {
        tracing::debug!(record, %reason, "skipping record");
        self.skipped.push(SkippedRecord { record, reason });
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}
