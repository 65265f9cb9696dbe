use serde_json::Value;
use std::path::Path;

use super::format::Format;
use super::formats::keepass::KDBX_SIGNATURE;
use super::handler::handler_for;

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn json_shape(content: &str) -> Option<Format> {
    let value: Value = serde_json::from_str(content).ok()?;
    let has = |key: &str| value.get(key).is_some();
    if has("encrypted") && has("items") {
        Some(Format::BitwardenJson)
    } else if value.get("credentials").is_some_and(Value::is_array) {
        Some(Format::DashlaneJson)
    } else {
        Some(Format::Native)
    }
}

/// Scores every handler against `content`, best first. Equal scores keep
/// registration order.
pub fn rank_formats(content: &str) -> Vec<(Format, u32)> {
    let mut ranked: Vec<(Format, u32)> = Format::ALL
        .into_iter()
        .filter_map(|f| handler_for(f).confidence(content).map(|score| (f, score)))
        .collect();
    // Stable sort keeps registration order among ties
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    tracing::debug!(?ranked, "format candidates");
    ranked
}

/// Guesses the layout of `content`, using the file name's extension first
/// when one is given.
pub fn detect_format(content: &str, filename: Option<&str>) -> Option<Format> {
    match filename.and_then(extension_of).as_deref() {
        Some("json") => {
            if let Some(format) = json_shape(content) {
                return Some(format);
            }
        }
        Some("1pif") => return Some(Format::OnePassword1pif),
        Some("kdbx") => return Some(Format::KeePassKdbx),
        _ => {}
    }
    rank_formats(content).first().map(|(f, _)| *f)
}

/// Like [`detect_format`] but works on raw bytes so binary databases are
/// recognised too.
pub fn detect_bytes(bytes: &[u8], filename: Option<&str>) -> Option<Format> {
    if bytes.starts_with(&KDBX_SIGNATURE) {
        return Some(Format::KeePassKdbx);
    }
    let text = std::str::from_utf8(bytes).ok()?;
    detect_format(text.strip_prefix('\u{feff}').unwrap_or(text), filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_extension_routes_by_shape() {
        let bw = r#"{"encrypted":false,"folders":[],"items":[]}"#;
        assert_eq!(detect_format(bw, Some("export.json")), Some(Format::BitwardenJson));
        assert_eq!(detect_format(bw, None), Some(Format::BitwardenJson));
        assert_eq!(detect_format(bw, Some("export.txt")), Some(Format::BitwardenJson));
        let dl = r#"{"credentials":[]}"#;
        assert_eq!(detect_format(dl, Some("dash.JSON")), Some(Format::DashlaneJson));
        assert_eq!(detect_format("{}", Some("mine.json")), Some(Format::Native));
    }

    #[test]
    fn broken_json_falls_through_to_validators() {
        let csv = "name,url,username,password\nBank,https://bank.example,bob,pw";
        assert_eq!(detect_format(csv, Some("oops.json")), Some(Format::ChromeCsv));
        assert_eq!(detect_format("{not json", Some("oops.json")), None);
    }

    #[test]
    fn pif_and_kdbx_extensions_win_immediately() {
        assert_eq!(detect_format("", Some("vault.1pif")), Some(Format::OnePassword1pif));
        assert_eq!(detect_format("", Some("db.kdbx")), Some(Format::KeePassKdbx));
    }

    #[test]
    fn kdbx_signature_detected_from_bytes() {
        let bytes = [0x03, 0xd9, 0xa2, 0x9a, 0x67, 0xfb, 0x4b, 0xb5, 0xff];
        assert_eq!(detect_bytes(&bytes, None), Some(Format::KeePassKdbx));
        assert_eq!(detect_bytes(&[0xff, 0xfe, 0x00], None), None);
    }

    #[test]
    fn unknown_content_is_none() {
        assert_eq!(detect_format("hello world", None), None);
    }
}
