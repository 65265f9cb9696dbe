//! CSV scanning and writing shared by every CSV-based format.

use std::collections::HashMap;

use super::error::TransferError;
use super::format::Format;

const BOM: char = '\u{feff}';

/// Iterator over logical CSV records. Newlines inside quoted fields are kept
/// as part of the record; blank records are skipped.
pub struct Records<'a> {
    rest: &'a str,
}

impl<'a> Records<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            rest: content.strip_prefix(BOM).unwrap_or(content),
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            let mut in_quotes = false;
            let mut end = self.rest.len();
            let mut next_start = self.rest.len();
            for (i, ch) in self.rest.char_indices() {
                match ch {
                    '"' => in_quotes = !in_quotes,
                    '\n' if !in_quotes => {
                        end = i;
                        next_start = i + 1;
                        break;
                    }
                    _ => {}
                }
            }
            let record = self.rest[..end].strip_suffix('\r').unwrap_or(&self.rest[..end]);
            self.rest = &self.rest[next_start..];
            if !record.trim().is_empty() {
                return Some(record);
            }
        }
    }
}

pub fn split_records(content: &str) -> Vec<&str> {
    Records::new(content).collect()
}

/// Splits one record into fields: single pass, tracking quote state,
/// splitting on unquoted commas and collapsing doubled quotes.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
    }
    fields.push(current);

    fields
}

/// Quotes the field only when it would otherwise break the record.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quote_csv_field(field)
    } else {
        field.to_string()
    }
}

pub fn quote_csv_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// Quote only fields containing separators, quotes or newlines.
    Minimal,
    /// Quote every field, the way browsers and KeePassXC write their exports.
    Always,
}

pub struct CsvWriter {
    out: String,
    quoting: Quoting,
}

impl CsvWriter {
    pub fn new(header: &[&str], quoting: Quoting) -> Self {
        let mut w = Self {
            out: String::new(),
            quoting,
        };
        w.record(header);
        w
    }

    pub fn record(&mut self, fields: &[&str]) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        let line = fields
            .iter()
            .map(|f| match self.quoting {
                Quoting::Minimal => escape_csv_field(f),
                Quoting::Always => quote_csv_field(f),
            })
            .collect::<Vec<_>>()
            .join(",");
        self.out.push_str(&line);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

fn normalize_header(h: &str) -> String {
    h.trim().trim_start_matches(BOM).to_lowercase()
}

/// Header names (lowercased) of the first record, if any.
pub fn sniff_headers(content: &str) -> Option<Vec<String>> {
    let first = Records::new(content).next()?;
    Some(parse_csv_line(first).iter().map(|h| normalize_header(h)).collect())
}

/// What a CSV format expects in its header row.
pub struct HeaderProfile {
    /// Each group lists interchangeable names; one per group must be present.
    pub required: &'static [&'static [&'static str]],
    /// Every header the vendor is known to write, used to score specificity.
    pub known: &'static [&'static str],
}

impl HeaderProfile {
    pub fn missing(&self, headers: &[String]) -> Vec<&'static str> {
        self.required
            .iter()
            .filter(|group| !group.iter().any(|name| headers.iter().any(|h| h == name)))
            .map(|group| group[0])
            .collect()
    }

    /// `None` when a required header is missing. Otherwise ranks by the
    /// number of known headers present, then by how much of the vendor's
    /// header set the file covers.
    pub fn score(&self, headers: &[String]) -> Option<u32> {
        if !self.missing(headers).is_empty() {
            return None;
        }
        let matched = self
            .known
            .iter()
            .filter(|name| headers.iter().any(|h| h == *name))
            .count() as u32;
        let coverage = matched * 100 / (self.known.len().max(1) as u32);
        Some(matched * 100 + coverage)
    }

    pub fn score_content(&self, content: &str) -> Option<u32> {
        let headers = sniff_headers(content)?;
        self.score(&headers)
    }
}

/// A parsed CSV file: lowercased headers plus raw data records.
pub struct CsvTable {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(content: &str, format: Format, profile: &HeaderProfile) -> Result<Self, TransferError> {
        let mut records = Records::new(content);
        let header_line = records.next().ok_or(TransferError::EmptyInput)?;
        let headers: Vec<String> = parse_csv_line(header_line)
            .iter()
            .map(|h| normalize_header(h))
            .collect();
        let missing = profile.missing(&headers);
        if !missing.is_empty() {
            return Err(TransferError::MissingHeaders {
                format,
                missing: missing.join(", "),
            });
        }

        let mut columns = HashMap::new();
        for (idx, name) in headers.into_iter().enumerate() {
            // First occurrence wins on duplicate header names
            columns.entry(name).or_insert(idx);
        }
        let rows = records.map(parse_csv_line).collect();
        Ok(Self { columns, rows })
    }

    pub fn rows(&self) -> impl Iterator<Item = CsvRecord<'_>> {
        self.rows.iter().map(move |values| CsvRecord {
            columns: &self.columns,
            values,
        })
    }
}

pub struct CsvRecord<'a> {
    columns: &'a HashMap<String, usize>,
    values: &'a [String],
}

impl<'a> CsvRecord<'a> {
    /// First non-empty value among `names`, verbatim; short rows read as
    /// empty. Whitespace-only values are kept.
    pub fn get(&self, names: &[&str]) -> &'a str {
        names
            .iter()
            .filter_map(|name| self.columns.get(*name))
            .filter_map(|idx| self.values.get(*idx))
            .map(|v| v.as_str())
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }

    /// For structural columns (types, flags) only.
    pub fn get_trimmed(&self, names: &[&str]) -> &'a str {
        self.get(names).trim()
    }

    pub fn flag(&self, names: &[&str]) -> bool {
        matches!(
            self.get_trimmed(names).to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y"
        )
    }
}
