use chrono::{DateTime, SecondsFormat, Utc};

use crate::transfer::csv::{CsvTable, CsvWriter, HeaderProfile, Quoting};
use crate::transfer::entry::PasswordEntry;
use crate::transfer::error::TransferError;
use crate::transfer::format::Format;
use crate::transfer::handler::{FormatHandler, ParseReport};

/// First bytes of every KeePass database file.
pub const KDBX_SIGNATURE: [u8; 4] = [0x03, 0xd9, 0xa2, 0x9a];

const ROOT_GROUP: &str = "Root";

const HEADER: [&str; 8] = [
    "Group",
    "Title",
    "Username",
    "Password",
    "URL",
    "Notes",
    "Last Modified",
    "Created",
];

// KeePassXC headers plus the KeePass 2 "Account"/"Login Name"/"Web Site" variant.
static PROFILE: HeaderProfile = HeaderProfile {
    required: &[&["title", "account"], &["password"]],
    known: &[
        "group",
        "title",
        "username",
        "password",
        "url",
        "notes",
        "totp",
        "icon",
        "last modified",
        "created",
        "account",
        "login name",
        "user name",
        "web site",
        "comments",
    ],
};

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// `Root/Work/Email` becomes `Work/Email`; the bare root group is no category.
fn group_to_category(group: &str) -> &str {
    let group = group.trim();
    if group == ROOT_GROUP {
        return "";
    }
    group
        .strip_prefix(ROOT_GROUP)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(group)
}

pub struct KeePassCsv;

impl FormatHandler for KeePassCsv {
    fn format(&self) -> Format {
        Format::KeePassCsv
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        PROFILE.score_content(content)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        let table = CsvTable::parse(content, Format::KeePassCsv, &PROFILE)?;
        let mut report = ParseReport::default();
        for (idx, row) in table.rows().enumerate() {
            let mut entry = PasswordEntry::new(
                row.get(&["title", "account"]),
                row.get(&["username", "user name", "login name"]),
                row.get(&["password"]),
            )
            .with_url(row.get(&["url", "web site"]))
            .with_notes(row.get(&["notes", "comments"]))
            .with_category(group_to_category(row.get(&["group"])));
            entry.updated_at = parse_timestamp(row.get(&["last modified"]));
            entry.created_at = parse_timestamp(row.get(&["created"]));
            report.push(idx + 1, entry);
        }
        Ok(report)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let mut w = CsvWriter::new(&HEADER, Quoting::Always);
        for e in entries {
            let group = match &e.category {
                Some(cat) => format!("{ROOT_GROUP}/{cat}"),
                None => ROOT_GROUP.to_string(),
            };
            let modified = format_timestamp(e.updated_at);
            let created = format_timestamp(e.created_at);
            w.record(&[
                &group,
                &e.site_name,
                &e.username,
                e.password_str(),
                e.url_str(),
                e.notes_str(),
                &modified,
                &created,
            ]);
        }
        Ok(w.finish())
    }
}

/// KeePass databases are listed so they can be recognised, but opening them
/// is not implemented.
pub struct KeePassKdbx;

impl FormatHandler for KeePassKdbx {
    fn format(&self) -> Format {
        Format::KeePassKdbx
    }

    fn confidence(&self, _content: &str) -> Option<u32> {
        None
    }

    fn parse(&self, _content: &str) -> Result<ParseReport, TransferError> {
        Err(TransferError::Unsupported(Format::KeePassKdbx))
    }

    fn export(&self, _entries: &[PasswordEntry]) -> Result<String, TransferError> {
        Err(TransferError::ExportNotSupported(Format::KeePassKdbx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_group_prefix_is_stripped() {
        assert_eq!(group_to_category("Root"), "");
        assert_eq!(group_to_category("Root/Work"), "Work");
        assert_eq!(group_to_category("Root/Work/Mail"), "Work/Mail");
        assert_eq!(group_to_category("Banque"), "Banque");
        assert_eq!(group_to_category("Rooted"), "Rooted");
    }

    #[test]
    fn bad_timestamps_are_ignored() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-03-01T10:00:00Z").is_some());
    }
}
