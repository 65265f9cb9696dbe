use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transfer::entry::PasswordEntry;
use crate::transfer::error::TransferError;
use crate::transfer::format::Format;
use crate::transfer::handler::{FormatHandler, ParseReport, SkipReason};

pub const APPLICATION: &str = "passerelle";
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentOut<'a> {
    application: &'static str,
    version: u32,
    exported_at: DateTime<Utc>,
    count: usize,
    entries: &'a [PasswordEntry],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentIn {
    Wrapped { entries: Vec<Value> },
    Bare(Vec<Value>),
}

/// Serializes entries as the application's own JSON document.
pub fn encode_document(entries: &[PasswordEntry]) -> Result<String, TransferError> {
    let doc = DocumentOut {
        application: APPLICATION,
        version: DOCUMENT_VERSION,
        exported_at: Utc::now(),
        count: entries.len(),
        entries,
    };
    serde_json::to_string_pretty(&doc).map_err(|source| TransferError::Serialize {
        format: Format::Native,
        source,
    })
}

pub fn decode_document(content: &str) -> Result<ParseReport, TransferError> {
    if content.trim().is_empty() {
        return Err(TransferError::EmptyInput);
    }
    let doc: DocumentIn = serde_json::from_str(content).map_err(|source| TransferError::InvalidJson {
        format: Format::Native,
        source,
    })?;
    let items = match doc {
        DocumentIn::Wrapped { entries } | DocumentIn::Bare(entries) => entries,
    };
    let mut report = ParseReport::default();
    for (idx, raw) in items.into_iter().enumerate() {
        let record = idx + 1;
        match serde_json::from_value::<PasswordEntry>(raw) {
            Ok(entry) => report.push(record, entry),
            Err(e) => report.skip(record, SkipReason::Malformed(e.to_string())),
        }
    }
    Ok(report)
}

pub struct NativeJson;

impl FormatHandler for NativeJson {
    fn format(&self) -> Format {
        Format::Native
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        let value: Value = serde_json::from_str(content).ok()?;
        match &value {
            Value::Object(obj) if obj.get("entries").is_some_and(Value::is_array) => {
                let ours = obj.get("application").and_then(Value::as_str) == Some(APPLICATION);
                Some(if ours { 10 } else { 6 })
            }
            Value::Array(items) => items
                .first()
                .and_then(|first| first.get("siteName"))
                .map(|_| 6),
            _ => None,
        }
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        decode_document(content)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        encode_document(entries)
    }
}
