use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::transfer::csv::{CsvTable, CsvWriter, HeaderProfile, Quoting};
use crate::transfer::entry::{new_entry_id, PasswordEntry};
use crate::transfer::error::TransferError;
use crate::transfer::format::Format;
use crate::transfer::handler::{FormatHandler, ParseReport, SkipReason};

const LOGIN_TYPE: u8 = 1;

// ===== JSON =====

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BitwardenExport {
    encrypted: bool,
    #[serde(default)]
    folders: Vec<Folder>,
    items: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Folder {
    id: String,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    organization_id: Option<String>,
    #[serde(default)]
    folder_id: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    reprompt: u8,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    favorite: bool,
    #[serde(default)]
    login: Option<Login>,
    #[serde(default)]
    collection_ids: Option<Vec<String>>,
    #[serde(default)]
    creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    revision_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Login {
    #[serde(default)]
    uris: Vec<LoginUri>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    totp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LoginUri {
    #[serde(rename = "match", default)]
    match_kind: Option<u8>,
    #[serde(default)]
    uri: Option<String>,
}

pub struct BitwardenJson;

impl FormatHandler for BitwardenJson {
    fn format(&self) -> Format {
        Format::BitwardenJson
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        let value: Value = serde_json::from_str(content).ok()?;
        let obj = value.as_object()?;
        let shaped = obj.get("encrypted").is_some_and(Value::is_boolean)
            && obj.get("items").is_some_and(Value::is_array);
        shaped.then_some(10)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        if content.trim().is_empty() {
            return Err(TransferError::EmptyInput);
        }
        let export: BitwardenExport =
            serde_json::from_str(content).map_err(|source| TransferError::InvalidJson {
                format: Format::BitwardenJson,
                source,
            })?;
        if export.encrypted {
            return Err(TransferError::EncryptedSource(Format::BitwardenJson));
        }

        let folders: HashMap<&str, &str> = export
            .folders
            .iter()
            .map(|f| (f.id.as_str(), f.name.as_str()))
            .collect();

        let mut report = ParseReport::default();
        for (idx, raw) in export.items.into_iter().enumerate() {
            let record = idx + 1;
            let item: Item = match serde_json::from_value(raw) {
                Ok(item) => item,
                Err(e) => {
                    report.skip(record, SkipReason::Malformed(e.to_string()));
                    continue;
                }
            };
            let login = match item.login {
                Some(login) if item.kind == LOGIN_TYPE => login,
                _ => {
                    report.skip(record, SkipReason::NotALogin);
                    continue;
                }
            };

            let mut entry = PasswordEntry::new(
                item.name.unwrap_or_default(),
                login.username.unwrap_or_default(),
                &login.password.unwrap_or_default(),
            );
            if let Some(id) = item.id.filter(|id| !id.is_empty()) {
                entry.id = id;
            }
            if let Some(uri) = login.uris.into_iter().find_map(|u| u.uri) {
                entry = entry.with_url(uri);
            }
            if let Some(notes) = item.notes {
                entry = entry.with_notes(notes);
            }
            if let Some(folder) = item.folder_id.as_deref().and_then(|id| folders.get(id)) {
                entry = entry.with_category(*folder);
            }
            entry.is_favorite = item.favorite;
            entry.created_at = item.creation_date;
            entry.updated_at = item.revision_date;
            report.push(record, entry);
        }
        Ok(report)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let mut folders: Vec<Folder> = Vec::new();
        let mut items = Vec::with_capacity(entries.len());
        for e in entries {
            let folder_id = e.category.as_deref().map(|name| {
                match folders.iter().find(|f| f.name == name) {
                    Some(f) => f.id.clone(),
                    None => {
                        let id = new_entry_id();
                        folders.push(Folder {
                            id: id.clone(),
                            name: name.to_string(),
                        });
                        id
                    }
                }
            });
            let item = Item {
                id: Some(e.id.clone()),
                organization_id: None,
                folder_id,
                kind: LOGIN_TYPE,
                reprompt: 0,
                name: Some(e.site_name.clone()),
                notes: e.notes.clone(),
                favorite: e.is_favorite,
                login: Some(Login {
                    uris: e
                        .site_url
                        .iter()
                        .map(|uri| LoginUri {
                            match_kind: None,
                            uri: Some(uri.clone()),
                        })
                        .collect(),
                    username: Some(e.username.clone()),
                    password: Some(e.password_str().to_string()),
                    totp: None,
                }),
                collection_ids: None,
                creation_date: e.created_at,
                revision_date: e.updated_at,
            };
            items.push(serde_json::to_value(item).map_err(|source| TransferError::Serialize {
                format: Format::BitwardenJson,
                source,
            })?);
        }
        let export = BitwardenExport {
            encrypted: false,
            folders,
            items,
        };
        serde_json::to_string_pretty(&export).map_err(|source| TransferError::Serialize {
            format: Format::BitwardenJson,
            source,
        })
    }
}

// ===== CSV =====

const CSV_HEADER: [&str; 11] = [
    "folder",
    "favorite",
    "type",
    "name",
    "notes",
    "fields",
    "reprompt",
    "login_uri",
    "login_username",
    "login_password",
    "login_totp",
];

static CSV_PROFILE: HeaderProfile = HeaderProfile {
    required: &[&["name"], &["login_username"], &["login_password"]],
    known: &CSV_HEADER,
};

pub struct BitwardenCsv;

impl FormatHandler for BitwardenCsv {
    fn format(&self) -> Format {
        Format::BitwardenCsv
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        CSV_PROFILE.score_content(content)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        let table = CsvTable::parse(content, Format::BitwardenCsv, &CSV_PROFILE)?;
        let mut report = ParseReport::default();
        for (idx, row) in table.rows().enumerate() {
            let record = idx + 1;
            let kind = row.get_trimmed(&["type"]);
            if !kind.is_empty() && !kind.eq_ignore_ascii_case("login") {
                report.skip(record, SkipReason::NotALogin);
                continue;
            }
            let mut entry = PasswordEntry::new(
                row.get(&["name"]),
                row.get(&["login_username"]),
                row.get(&["login_password"]),
            )
            .with_url(row.get(&["login_uri"]))
            .with_notes(row.get(&["notes"]))
            .with_category(row.get(&["folder"]));
            entry.is_favorite = row.flag(&["favorite"]);
            report.push(record, entry);
        }
        Ok(report)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let mut w = CsvWriter::new(&CSV_HEADER, Quoting::Minimal);
        for e in entries {
            w.record(&[
                e.category_str(),
                if e.is_favorite { "1" } else { "" },
                "login",
                &e.site_name,
                e.notes_str(),
                "",
                "0",
                e.url_str(),
                &e.username,
                e.password_str(),
                "",
            ]);
        }
        Ok(w.finish())
    }
}
