use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::transfer::csv::{CsvTable, CsvWriter, HeaderProfile, Quoting};
use crate::transfer::entry::PasswordEntry;
use crate::transfer::error::TransferError;
use crate::transfer::format::Format;
use crate::transfer::handler::{FormatHandler, ParseReport, SkipReason};

use super::{join_tags, split_tags};

// ===== 1PIF =====

/// Line written between records in a 1PIF file.
pub const PIF_SEPARATOR: &str = "***5642bee8-a5ff-11dc-8314-0800200c9a66***";
const WEB_FORM: &str = "webforms.WebForm";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PifItem {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    type_name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    secure_contents: SecureContents,
    #[serde(default)]
    open_contents: OpenContents,
    #[serde(default)]
    fave_index: Option<i64>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    updated_at: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecureContents {
    #[serde(default)]
    fields: Vec<PifField>,
    #[serde(default)]
    notes_plain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenContents {
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PifField {
    #[serde(default)]
    designation: Option<String>,
    #[serde(default)]
    value: Value,
}

impl SecureContents {
    fn designated(&self, designation: &str) -> &str {
        self.fields
            .iter()
            .filter(|f| f.designation.as_deref() == Some(designation))
            .find_map(|f| f.value.as_str())
            .unwrap_or("")
    }
}

fn from_unix(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

/// Non-empty lines that are not record separators.
fn pif_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("***"))
}

pub struct OnePassword1pif;

impl FormatHandler for OnePassword1pif {
    fn format(&self) -> Format {
        Format::OnePassword1pif
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        let first = pif_lines(content).next()?;
        let value: Value = serde_json::from_str(first).ok()?;
        let obj = value.as_object()?;
        ["uuid", "title", "typeName"]
            .iter()
            .all(|k| obj.contains_key(*k))
            .then_some(10)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        let mut report = ParseReport::default();
        let mut parsed_any = false;
        let mut last_error = None;
        let mut seen = 0;

        for (idx, line) in pif_lines(content).enumerate() {
            let record = idx + 1;
            seen = record;
            let item: PifItem = match serde_json::from_str(line) {
                Ok(item) => item,
                Err(e) => {
                    report.skip(record, SkipReason::Malformed(e.to_string()));
                    last_error = Some(e);
                    continue;
                }
            };
            parsed_any = true;
            if item.type_name != WEB_FORM {
                report.skip(record, SkipReason::NotALogin);
                continue;
            }
            let contents = &item.secure_contents;
            let mut entry = PasswordEntry::new(
                item.title.clone().unwrap_or_default(),
                contents.designated("username"),
                contents.designated("password"),
            )
            .with_url(item.location.clone().unwrap_or_default())
            .with_notes(contents.notes_plain.clone().unwrap_or_default());
            if let Some(uuid) = item.uuid.filter(|u| !u.is_empty()) {
                entry.id = uuid;
            }
            entry.tags = item.open_contents.tags;
            entry.is_favorite = item.fave_index.is_some_and(|i| i > 0);
            entry.created_at = from_unix(item.created_at);
            entry.updated_at = from_unix(item.updated_at);
            report.push(record, entry);
        }

        if seen == 0 {
            return Err(TransferError::EmptyInput);
        }
        match last_error {
            Some(source) if !parsed_any => Err(TransferError::InvalidJson {
                format: Format::OnePassword1pif,
                source,
            }),
            _ => Ok(report),
        }
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let mut out = String::new();
        for e in entries {
            let mut item = json!({
                "uuid": e.id,
                "title": e.site_name,
                "typeName": WEB_FORM,
                "securityLevel": "SL5",
                "secureContents": {
                    "fields": [
                        { "designation": "username", "name": "username", "type": "T", "value": e.username },
                        { "designation": "password", "name": "password", "type": "P", "value": e.password_str() },
                    ],
                },
                "openContents": { "tags": e.tags },
            });
            if let Some(url) = &e.site_url {
                item["location"] = json!(url);
                item["secureContents"]["URLs"] = json!([{ "label": "website", "url": url }]);
            }
            if let Some(notes) = &e.notes {
                item["secureContents"]["notesPlain"] = json!(notes);
            }
            if e.is_favorite {
                item["faveIndex"] = json!(1);
            }
            if let Some(ts) = e.created_at {
                item["createdAt"] = json!(ts.timestamp());
            }
            if let Some(ts) = e.updated_at {
                item["updatedAt"] = json!(ts.timestamp());
            }
            let line = serde_json::to_string(&item).map_err(|source| TransferError::Serialize {
                format: Format::OnePassword1pif,
                source,
            })?;
            out.push_str(&line);
            out.push('\n');
            out.push_str(PIF_SEPARATOR);
            out.push('\n');
        }
        Ok(out)
    }
}

// ===== CSV =====

const CSV_HEADER: [&str; 9] = [
    "Title", "Url", "Username", "Password", "OTPAuth", "Favorite", "Archived", "Tags", "Notes",
];

static CSV_PROFILE: HeaderProfile = HeaderProfile {
    required: &[&["title"], &["username"], &["password"]],
    known: &[
        "title", "url", "website", "username", "password", "otpauth", "favorite", "archived",
        "tags", "notes",
    ],
};

pub struct OnePasswordCsv;

impl FormatHandler for OnePasswordCsv {
    fn format(&self) -> Format {
        Format::OnePasswordCsv
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        CSV_PROFILE.score_content(content)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        let table = CsvTable::parse(content, Format::OnePasswordCsv, &CSV_PROFILE)?;
        let mut report = ParseReport::default();
        for (idx, row) in table.rows().enumerate() {
            let mut entry = PasswordEntry::new(
                row.get(&["title"]),
                row.get(&["username"]),
                row.get(&["password"]),
            )
            .with_url(row.get(&["url", "website"]))
            .with_notes(row.get(&["notes"]));
            entry.tags = split_tags(row.get(&["tags"]), ';');
            entry.is_favorite = row.flag(&["favorite"]);
            report.push(idx + 1, entry);
        }
        Ok(report)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let mut w = CsvWriter::new(&CSV_HEADER, Quoting::Minimal);
        for e in entries {
            let tags = join_tags(&e.tags, ";");
            w.record(&[
                &e.site_name,
                e.url_str(),
                &e.username,
                e.password_str(),
                "",
                if e.is_favorite { "true" } else { "false" },
                "false",
                &tags,
                e.notes_str(),
            ]);
        }
        Ok(w.finish())
    }
}
