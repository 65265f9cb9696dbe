use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::core::crypto::{self, KdfParams};

use super::error::TransferError;

pub const ARMOR_BEGIN: &str = "-----BEGIN PASSERELLE EXPORT-----";
pub const ARMOR_END: &str = "-----END PASSERELLE EXPORT-----";
const ARMOR_WIDTH: usize = 64;

/// How an export is protected before it is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportCipher {
    #[default]
    None,
    /// Argon2id-derived key with AES-256-GCM.
    Aead,
    /// XOR obfuscation written by the browser version of the tool. It offers
    /// no confidentiality and is kept only to exchange files with it.
    LegacyXor,
}

impl ExportCipher {
    pub fn is_encrypted(self) -> bool {
        !matches!(self, ExportCipher::None)
    }
}

impl fmt::Display for ExportCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportCipher::None => "none",
            ExportCipher::Aead => "aead",
            ExportCipher::LegacyXor => "xor",
        })
    }
}

impl FromStr for ExportCipher {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(ExportCipher::None),
            "aead" | "aes" | "aes-gcm" => Ok(ExportCipher::Aead),
            "xor" | "legacy-xor" => Ok(ExportCipher::LegacyXor),
            other => Err(TransferError::Cipher(format!("unknown cipher \"{other}\""))),
        }
    }
}

fn require_passphrase(passphrase: &str) -> Result<(), TransferError> {
    if passphrase.is_empty() {
        return Err(TransferError::Cipher("passphrase must not be empty".into()));
    }
    Ok(())
}

/// XORs each UTF-16 code unit with the passphrase repeated cyclically and
/// base64-encodes one byte per unit, the layout `btoa` produces. A unit that
/// does not fit in a byte is rejected, as `btoa` rejects it.
pub fn xor_encode(plain: &str, passphrase: &str) -> Result<String, TransferError> {
    require_passphrase(passphrase)?;
    let key: Vec<u16> = passphrase.encode_utf16().collect();
    let bytes = plain
        .encode_utf16()
        .zip(key.iter().cycle())
        .map(|(c, k)| {
            u8::try_from(c ^ k).map_err(|_| {
                TransferError::Cipher(format!(
                    "character U+{c:04X} cannot be XOR-encoded with this passphrase (byte range only)"
                ))
            })
        })
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(STANDARD.encode(bytes))
}

pub fn xor_decode(encoded: &str, passphrase: &str) -> Result<String, TransferError> {
    require_passphrase(passphrase)?;
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| TransferError::Cipher(format!("invalid base64: {e}")))?;
    let key: Vec<u16> = passphrase.encode_utf16().collect();
    let units: Vec<u16> = bytes
        .iter()
        .zip(key.iter().cycle())
        .map(|(b, k)| u16::from(*b) ^ k)
        .collect();
    String::from_utf16(&units)
        .map_err(|_| TransferError::Cipher("payload is not valid UTF-16 (wrong passphrase?)".into()))
}

pub fn is_armored(text: &str) -> bool {
    text.trim_start().starts_with(ARMOR_BEGIN)
}

/// Seals `plain` and wraps it in an ASCII armor block.
pub fn seal_export(plain: &str, passphrase: &str, params: KdfParams) -> Result<String, TransferError> {
    require_passphrase(passphrase)?;
    let sealed = crypto::seal(plain.as_bytes(), passphrase, params)
        .map_err(|e| TransferError::Cipher(e.to_string()))?;
    let body = STANDARD.encode(sealed);
    let mut out = String::with_capacity(body.len() + 100);
    out.push_str(ARMOR_BEGIN);
    out.push('\n');
    for chunk in body.as_bytes().chunks(ARMOR_WIDTH) {
        // base64 output is ASCII
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }
    out.push_str(ARMOR_END);
    out.push('\n');
    Ok(out)
}

pub fn open_export(armored: &str, passphrase: &str) -> Result<String, TransferError> {
    let body: String = armored
        .lines()
        .map(str::trim)
        .skip_while(|l| *l != ARMOR_BEGIN)
        .skip(1)
        .take_while(|l| *l != ARMOR_END)
        .collect();
    if body.is_empty() {
        return Err(TransferError::Cipher("missing armored payload".into()));
    }
    let sealed = STANDARD
        .decode(body)
        .map_err(|e| TransferError::Cipher(format!("invalid base64: {e}")))?;
    let plain = crypto::open(&sealed, passphrase).map_err(|e| TransferError::Cipher(e.to_string()))?;
    String::from_utf8(plain).map_err(|_| TransferError::NotText)
}

/// Applies `cipher` to an export body.
pub fn encrypt_export(
    plain: &str,
    cipher: ExportCipher,
    passphrase: &str,
    params: KdfParams,
) -> Result<String, TransferError> {
    match cipher {
        ExportCipher::None => Ok(plain.to_string()),
        ExportCipher::Aead => seal_export(plain, passphrase, params),
        ExportCipher::LegacyXor => {
            tracing::warn!("legacy XOR output is obfuscated, not encrypted");
            xor_encode(plain, passphrase)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfParams = KdfParams {
        m_cost_kib: 1024,
        t_cost: 1,
        p_lanes: 1,
    };

    #[test]
    fn xor_round_trips_latin1_text() {
        let plain = "Mot de passe: éàç ñ";
        let encoded = xor_encode(plain, "clé").unwrap();
        assert_ne!(encoded, plain);
        assert_eq!(xor_decode(&encoded, "clé").unwrap(), plain);
    }

    #[test]
    fn xor_rejects_units_outside_the_byte_range() {
        let err = xor_encode("prix: 5€", "clé").unwrap_err();
        assert!(matches!(err, TransferError::Cipher(_)));
    }

    #[test]
    fn xor_rejects_empty_passphrase() {
        assert!(xor_encode("x", "").is_err());
        assert!(xor_decode("AA==", "").is_err());
    }

    #[test]
    fn xor_matches_btoa_layout() {
        // 'A' (0x41) ^ 'k' (0x6b) = 0x2a; btoa("\x2a") == "Kg=="
        assert_eq!(xor_encode("A", "k").unwrap(), "Kg==");
        assert_eq!(xor_decode("Kg==", "k").unwrap(), "A");
        // "ab" ^ "k" cycled: 0x0a, 0x09
        assert_eq!(xor_encode("ab", "k").unwrap(), "Cgk=");
    }

    #[test]
    fn armored_export_round_trips() {
        let armored = seal_export("name,password\nBank,pw", "s3cret", FAST).unwrap();
        assert!(is_armored(&armored));
        assert!(armored.trim_end().ends_with(ARMOR_END));
        assert!(armored.lines().all(|l| l.len() <= ARMOR_WIDTH.max(ARMOR_BEGIN.len())));
        assert_eq!(open_export(&armored, "s3cret").unwrap(), "name,password\nBank,pw");
        assert!(open_export(&armored, "wrong").is_err());
    }

    #[test]
    fn cipher_names_parse() {
        assert_eq!("AEAD".parse::<ExportCipher>().unwrap(), ExportCipher::Aead);
        assert_eq!("xor".parse::<ExportCipher>().unwrap(), ExportCipher::LegacyXor);
        assert!("rot13".parse::<ExportCipher>().is_err());
    }
}
