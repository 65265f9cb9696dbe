use url::Url;

use crate::transfer::csv::{CsvTable, CsvWriter, HeaderProfile, Quoting};
use crate::transfer::entry::PasswordEntry;
use crate::transfer::error::TransferError;
use crate::transfer::format::Format;
use crate::transfer::handler::{FormatHandler, ParseReport};

const HEADER: [&str; 5] = ["name", "url", "username", "password", "note"];

static PROFILE: HeaderProfile = HeaderProfile {
    required: &[&["name"], &["url"], &["username"], &["password"]],
    known: &["name", "url", "username", "password", "note"],
};

/// Host of `raw` without a leading `www.`; the raw string when it is not a
/// parseable URL.
pub fn site_name_from_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => match url.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
            None => raw.to_string(),
        },
        Err(_) => raw.to_string(),
    }
}

pub struct ChromeCsv;

impl FormatHandler for ChromeCsv {
    fn format(&self) -> Format {
        Format::ChromeCsv
    }

    fn confidence(&self, content: &str) -> Option<u32> {
        PROFILE.score_content(content)
    }

    fn parse(&self, content: &str) -> Result<ParseReport, TransferError> {
        let table = CsvTable::parse(content, Format::ChromeCsv, &PROFILE)?;
        let mut report = ParseReport::default();
        for (idx, row) in table.rows().enumerate() {
            let url = row.get(&["url"]);
            let name = row.get(&["name"]);
            let site_name = if name.trim().is_empty() && !url.trim().is_empty() {
                site_name_from_url(url.trim())
            } else {
                name.to_string()
            };
            let entry = PasswordEntry::new(site_name, row.get(&["username"]), row.get(&["password"]))
                .with_url(url)
                .with_notes(row.get(&["note"]));
            report.push(idx + 1, entry);
        }
        Ok(report)
    }

    fn export(&self, entries: &[PasswordEntry]) -> Result<String, TransferError> {
        let mut w = CsvWriter::new(&HEADER, Quoting::Always);
        for e in entries {
            w.record(&[&e.site_name, e.url_str(), &e.username, e.password_str(), e.notes_str()]);
        }
        Ok(w.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_strips_www_prefix() {
        assert_eq!(site_name_from_url("https://www.example.com/login"), "example.com");
        assert_eq!(site_name_from_url("https://accounts.google.com"), "accounts.google.com");
    }

    #[test]
    fn unparseable_url_is_kept_verbatim() {
        assert_eq!(site_name_from_url("intranet local"), "intranet local");
        assert_eq!(site_name_from_url("example.com"), "example.com");
    }
}
