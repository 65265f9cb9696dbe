use crate::transfer::csv::{CsvTable, CsvWriter, HeaderProfile, Quoting};
use crate::transfer::entry::PasswordEntry;
use crate::transfer::error::TransferError;
use crate::transfer::format::Format;
use crate::transfer::handler::{FormatHandler, ParseReport, SkipReason};

const HEADER: [&str; 8] = [
    "url", "username", "password", "totp", "extra", "name", "grouping", "fav",
];

/// LastPass stores secure notes as rows with this pseudo URL.
const SECURE_NOTE_URL: &str = "http://sn";

static PROFILE: HeaderProfile = HeaderProfile {
    required: &[&["url"], &["username"], &["password"], &["name"]],
    known: &HEADER,
};

pub struct LastPassCsv;

impl FormatHandler for LastPassCsv {
    fn format(&self) -> Format {
        Format::LastPassCsv
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        PROFILE.score_content(content)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        let table = CsvTable::parse(content, Format::LastPassCsv, &PROFILE)?;
        let mut report = ParseReport::default();
        for (idx, row) in table.rows().enumerate() {
            let record = idx + 1;
            let url = row.get(&["url"]);
            if url.trim().eq_ignore_ascii_case(SECURE_NOTE_URL) {
                report.skip(record, SkipReason::NotALogin);
                continue;
            }
            let mut entry = PasswordEntry::new(
                row.get(&["name"]),
                row.get(&["username"]),
                row.get(&["password"]),
            )
            .with_url(url)
            .with_notes(row.get(&["extra"]))
            .with_category(row.get(&["grouping"]));
            entry.is_favorite = row.flag(&["fav"]);
            report.push(record, entry);
        }
        Ok(report)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let mut w = CsvWriter::new(&HEADER, Quoting::Minimal);
        for e in entries {
            w.record(&[
                e.url_str(),
                &e.username,
                e.password_str(),
                "",
                e.notes_str(),
                &e.site_name,
                e.category_str(),
                if e.is_favorite { "1" } else { "0" },
            ]);
        }
        Ok(w.finish())
    }
}
