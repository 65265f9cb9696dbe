use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::format::Format;

pub const MAX_FILE_NAME_LEN: usize = 255;
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileNameError {
    #[error("file name is empty")]
    Empty,
    #[error("file name is longer than {MAX_FILE_NAME_LEN} characters")]
    TooLong,
    #[error("file name contains the forbidden character {0:?}")]
    ForbiddenCharacter(char),
    #[error("\"{0}\" is a reserved device name")]
    Reserved(String),
}

/// Lowercase ASCII slug: diacritics removed, every run of other characters
/// collapsed to a single hyphen.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for ch in input.nfd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[derive(Debug, Clone)]
pub struct FileNameOptions<'a> {
    pub app_name: &'a str,
    pub username: Option<&'a str>,
    pub format: Format,
    /// Defaults to the format's preferred extension.
    pub extension: Option<&'a str>,
    pub encrypted: bool,
    /// Defaults to the local time of the call.
    pub timestamp: Option<NaiveDateTime>,
    pub item_count: Option<usize>,
}

impl<'a> FileNameOptions<'a> {
    pub fn new(app_name: &'a str, format: Format) -> Self {
        Self {
            app_name,
            username: None,
            format,
            extension: None,
            encrypted: false,
            timestamp: None,
            item_count: None,
        }
    }
}

/// `{app}_{user}_{format}[_{n}-entrees]_{YYYY-MM-DD_HH-MM-SS}[_encrypted].{ext}`,
/// empty parts omitted, then sanitized.
pub fn generate_file_name(opts: &FileNameOptions<'_>) -> String {
    let mut parts: Vec<String> = [
        Some(opts.app_name),
        opts.username,
        Some(opts.format.id()),
    ]
    .into_iter()
    .flatten()
    .map(slugify)
    .filter(|s| !s.is_empty())
    .collect();

    if let Some(n) = opts.item_count {
        parts.push(format!("{n}-entrees"));
    }
    let ts = opts.timestamp.unwrap_or_else(|| Local::now().naive_local());
    parts.push(ts.format("%Y-%m-%d_%H-%M-%S").to_string());
    if opts.encrypted {
        parts.push("encrypted".to_string());
    }

    let ext = opts
        .extension
        .map(|e| e.trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| opts.format.default_extension());
    sanitize_file_name(&format!("{}.{}", parts.join("_"), ext))
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

fn is_reserved(name: &str) -> bool {
    let (stem, _) = split_extension(name);
    let stem = stem.split('.').next().unwrap_or(stem);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem.trim()))
}

/// Makes `name` safe to create on Windows, macOS and Linux.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();
    let mut cleaned = cleaned.trim_end_matches(['.', ' ']).trim_start().to_string();
    if cleaned.is_empty() {
        cleaned = "export".to_string();
    }
    if is_reserved(&cleaned) {
        cleaned.insert(0, '_');
    }

    if cleaned.chars().count() > MAX_FILE_NAME_LEN {
        let (stem, ext) = split_extension(&cleaned);
        let ext_len = ext.chars().count();
        let (stem, ext) = if ext_len >= MAX_FILE_NAME_LEN {
            (cleaned.as_str(), "")
        } else {
            (stem, ext)
        };
        let keep = MAX_FILE_NAME_LEN - ext.chars().count();
        let truncated: String = stem.chars().take(keep).collect();
        cleaned = format!("{truncated}{ext}");
    }
    cleaned
}

pub fn validate_file_name(name: &str) -> Result<(), FileNameError> {
    if name.trim().is_empty() {
        return Err(FileNameError::Empty);
    }
    if name.chars().count() > MAX_FILE_NAME_LEN {
        return Err(FileNameError::TooLong);
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN.contains(c) || c.is_control()) {
        return Err(FileNameError::ForbiddenCharacter(c));
    }
    if is_reserved(name) {
        return Err(FileNameError::Reserved(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    #[test]
    fn slugify_strips_diacritics_and_punctuation() {
        assert_eq!(slugify("Café Été!"), "cafe-ete");
        assert_eq!(slugify("  --Mon  Coffre--  "), "mon-coffre");
        assert_eq!(slugify("1Password (CSV)"), "1password-csv");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn generated_name_has_all_parts() {
        let mut opts = FileNameOptions::new("Boîte à Outils", Format::BitwardenJson);
        opts.username = Some("Élodie");
        opts.timestamp = Some(fixed_ts());
        opts.item_count = Some(12);
        opts.encrypted = true;
        assert_eq!(
            generate_file_name(&opts),
            "boite-a-outils_elodie_bitwarden-json_12-entrees_2026-03-09_14-05-07_encrypted.json"
        );
    }

    #[test]
    fn generated_name_skips_empty_parts_and_accepts_dotted_extension() {
        let mut opts = FileNameOptions::new("Passerelle", Format::ChromeCsv);
        opts.username = Some("???");
        opts.extension = Some(".txt");
        opts.timestamp = Some(fixed_ts());
        assert_eq!(
            generate_file_name(&opts),
            "passerelle_chrome-csv_2026-03-09_14-05-07.txt"
        );
    }

    #[test]
    fn reserved_names_get_underscore_prefix() {
        assert_eq!(sanitize_file_name("CON.json"), "_CON.json");
        assert_eq!(sanitize_file_name("lpt1"), "_lpt1");
        assert_eq!(sanitize_file_name("console.json"), "console.json");
    }

    #[test]
    fn forbidden_characters_are_removed() {
        assert_eq!(sanitize_file_name("a<b>c:d\"e/f\\g|h?i*j\u{7}.csv"), "abcdefghij.csv");
        assert_eq!(sanitize_file_name("..."), "export");
    }

    #[test]
    fn long_names_keep_their_extension() {
        let name = format!("{}.json", "x".repeat(300));
        let out = sanitize_file_name(&name);
        assert!(out.chars().count() <= MAX_FILE_NAME_LEN);
        assert!(out.ends_with(".json"));
    }

    #[test]
    fn validation_reports_first_violation() {
        assert_eq!(validate_file_name(""), Err(FileNameError::Empty));
        assert_eq!(
            validate_file_name("a?b"),
            Err(FileNameError::ForbiddenCharacter('?'))
        );
        assert_eq!(
            validate_file_name("nul.txt"),
            Err(FileNameError::Reserved("nul.txt".into()))
        );
        assert_eq!(validate_file_name(&"y".repeat(256)), Err(FileNameError::TooLong));
        assert!(validate_file_name("export.csv").is_ok());
    }
}
