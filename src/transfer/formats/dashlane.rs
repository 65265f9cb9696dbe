use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transfer::csv::{CsvTable, CsvWriter, HeaderProfile, Quoting};
use crate::transfer::entry::PasswordEntry;
use crate::transfer::error::TransferError;
use crate::transfer::format::Format;
use crate::transfer::handler::{FormatHandler, ParseReport, SkipReason};

/// First present, non-empty candidate, verbatim.
fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> &'a str {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|v| !v.is_empty())
        .unwrap_or("")
}

// ===== CSV =====

const CSV_HEADER: [&str; 9] = [
    "username",
    "username2",
    "username3",
    "title",
    "password",
    "note",
    "url",
    "category",
    "otpSecret",
];

static CSV_PROFILE: HeaderProfile = HeaderProfile {
    required: &[&["title"], &["url"], &["username", "email", "login"], &["password"]],
    known: &[
        "username",
        "username2",
        "username3",
        "title",
        "password",
        "note",
        "url",
        "category",
        "otpsecret",
        "email",
        "login",
    ],
};

pub struct DashlaneCsv;

impl FormatHandler for DashlaneCsv {
    fn format(&self) -> Format {
        Format::DashlaneCsv
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        CSV_PROFILE.score_content(content)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        let table = CsvTable::parse(content, Format::DashlaneCsv, &CSV_PROFILE)?;
        let mut report = ParseReport::default();
        for (idx, row) in table.rows().enumerate() {
            let entry = PasswordEntry::new(
                row.get(&["title"]),
                row.get(&["username", "email", "login"]),
                row.get(&["password"]),
            )
            .with_url(row.get(&["url"]))
            .with_notes(row.get(&["note"]))
            .with_category(row.get(&["category"]));
            report.push(idx + 1, entry);
        }
        Ok(report)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let mut w = CsvWriter::new(&CSV_HEADER, Quoting::Minimal);
        for e in entries {
            w.record(&[
                &e.username,
                "",
                "",
                &e.site_name,
                e.password_str(),
                e.notes_str(),
                e.url_str(),
                e.category_str(),
                "",
            ]);
        }
        Ok(w.finish())
    }
}

// ===== JSON =====

#[derive(Debug, Serialize, Deserialize)]
struct DashlaneExport {
    credentials: Vec<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Credential {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, skip_serializing)]
    domain: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, skip_serializing)]
    login: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

pub struct DashlaneJson;

impl FormatHandler for DashlaneJson {
    fn format(&self) -> Format {
        Format::DashlaneJson
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        let value: Value = serde_json::from_str(content).ok()?;
        value
            .get("credentials")
            .is_some_and(Value::is_array)
            .then_some(10)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        if content.trim().is_empty() {
            return Err(TransferError::EmptyInput);
        }
        let export: DashlaneExport =
            serde_json::from_str(content).map_err(|source| TransferError::InvalidJson {
                format: Format::DashlaneJson,
                source,
            })?;
        let mut report = ParseReport::default();
        for (idx, raw) in export.credentials.into_iter().enumerate() {
            let record = idx + 1;
            let cred: Credential = match serde_json::from_value(raw) {
                Ok(c) => c,
                Err(e) => {
                    report.skip(record, SkipReason::Malformed(e.to_string()));
                    continue;
                }
            };
            let entry = PasswordEntry::new(
                first_non_empty(&[&cred.title]),
                first_non_empty(&[&cred.username, &cred.email, &cred.login]),
                first_non_empty(&[&cred.password]),
            )
            .with_url(first_non_empty(&[&cred.url, &cred.domain]))
            .with_notes(first_non_empty(&[&cred.note]))
            .with_category(first_non_empty(&[&cred.category]));
            report.push(record, entry);
        }
        Ok(report)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let to_value = |c: Credential| {
            serde_json::to_value(c).map_err(|source| TransferError::Serialize {
                format: Format::DashlaneJson,
                source,
            })
        };
        let credentials = entries
            .iter()
            .map(|e| {
                to_value(Credential {
                    title: Some(e.site_name.clone()),
                    url: e.site_url.clone(),
                    username: Some(e.username.clone()),
                    email: e.username.contains('@').then(|| e.username.clone()),
                    password: Some(e.password_str().to_string()),
                    note: e.notes.clone(),
                    category: e.category.clone(),
                    ..Credential::default()
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        serde_json::to_string_pretty(&DashlaneExport { credentials }).map_err(|source| {
            TransferError::Serialize {
                format: Format::DashlaneJson,
                source,
            }
        })
    }
}
