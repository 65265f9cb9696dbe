use anyhow::{anyhow, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use ring::{
    aead,
    rand::{SecureRandom, SystemRandom},
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

pub const KEY_LEN: usize = 32; // 256-bit key
pub const NONCE_LEN: usize = 12; // 96-bit GCM nonce
pub const SALT_LEN: usize = 16; // Argon2 salt

// Envelope header layout (little-endian):
// magic: 4 bytes = b"PSRL"
// version: u16 = 1
// kdf_id: u8 (2 = Argon2id; other values unsupported)
// aead_id: u8 (1 = AES-256-GCM)
// m_cost_kib: u32
// t_cost: u32
// p_lanes: u32
// salt: [u8; SALT_LEN]
// nonce: [u8; NONCE_LEN]
pub const HEADER_MAGIC: &[u8; 4] = b"PSRL";
pub const HEADER_VERSION: u16 = 1;
pub const KDF_ARGON2ID: u8 = 2;
pub const AEAD_AES256GCM: u8 = 1;
pub const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 4 * 3 + SALT_LEN + NONCE_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_lanes: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // 64 MiB, 3 iterations, 1 lane
        Self {
            m_cost_kib: 64 * 1024,
            t_cost: 3,
            p_lanes: 1,
        }
    }
}

pub fn derive_key_argon2id(password: &str, salt: &[u8], params: KdfParams) -> Result<[u8; KEY_LEN]> {
    let argon_params = Params::new(params.m_cost_kib, params.t_cost, params.p_lanes, Some(KEY_LEN))
        .map_err(|e| anyhow!("invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow!("argon2 key derivation failed: {e}"))?;
    Ok(key)
}

fn build_header(salt: &[u8; SALT_LEN], nonce: &[u8; NONCE_LEN], params: KdfParams) -> Vec<u8> {
    let mut h = Vec::with_capacity(HEADER_LEN);
    h.extend_from_slice(HEADER_MAGIC);
    h.extend_from_slice(&HEADER_VERSION.to_le_bytes());
    h.push(KDF_ARGON2ID);
    h.push(AEAD_AES256GCM);
    h.extend_from_slice(&params.m_cost_kib.to_le_bytes());
    h.extend_from_slice(&params.t_cost.to_le_bytes());
    h.extend_from_slice(&params.p_lanes.to_le_bytes());
    h.extend_from_slice(salt);
    h.extend_from_slice(nonce);
    h
}

#[derive(Debug, Clone)]
pub struct EnvelopeHeader {
    pub version: u16,
    pub params: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("ciphertext too short for header")]
    TooShort,
    #[error("invalid magic (expected PSRL)")]
    InvalidMagic,
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u16),
    #[error("unsupported kdf id: {0}")]
    UnsupportedKdf(u8),
    #[error("unsupported aead id: {0}")]
    UnsupportedAead(u8),
}

fn read_u32(data: &[u8], off: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&data[off..off + 4]);
    u32::from_le_bytes(b)
}

pub fn parse_header(data: &[u8]) -> std::result::Result<(EnvelopeHeader, usize), HeaderError> {
    if data.len() < HEADER_LEN {
        return Err(HeaderError::TooShort);
    }
    if &data[0..4] != HEADER_MAGIC {
        return Err(HeaderError::InvalidMagic);
    }
    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != HEADER_VERSION {
        return Err(HeaderError::UnsupportedVersion(version));
    }
    if data[6] != KDF_ARGON2ID {
        return Err(HeaderError::UnsupportedKdf(data[6]));
    }
    if data[7] != AEAD_AES256GCM {
        return Err(HeaderError::UnsupportedAead(data[7]));
    }
    let params = KdfParams {
        m_cost_kib: read_u32(data, 8),
        t_cost: read_u32(data, 12),
        p_lanes: read_u32(data, 16),
    };
    let salt_off = 20;
    let nonce_off = salt_off + SALT_LEN;
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&data[salt_off..nonce_off]);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&data[nonce_off..HEADER_LEN]);
    let header = EnvelopeHeader {
        version,
        params,
        salt,
        nonce,
    };
    Ok((header, HEADER_LEN))
}

/// Derives a key from `password` with fresh salt and seals `data`.
pub fn seal(data: &[u8], password: &str, params: KdfParams) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| anyhow!("failed to generate salt"))?;
    let mut key = derive_key_argon2id(password, &salt, params)?;
    let out = seal_with_key(data, params, salt, &key);
    key.zeroize();
    out
}

pub fn open(data: &[u8], password: &str) -> Result<Vec<u8>> {
    let (hdr, _) = parse_header(data).map_err(|e| anyhow!("invalid header: {e}"))?;
    let mut key = derive_key_argon2id(password, &hdr.salt, hdr.params)?;
    let out = open_with_key(data, &key);
    key.zeroize();
    out
}

/// Seals with an already derived key. A new random nonce is generated and the
/// header is authenticated as associated data.
pub fn seal_with_key(
    data: &[u8],
    params: KdfParams,
    salt: [u8; SALT_LEN],
    derived_key: &[u8; KEY_LEN],
) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| anyhow!("failed to generate nonce"))?;

    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, derived_key)
        .map_err(|_| anyhow!("failed to create sealing key"))?;
    let sealing_key = aead::LessSafeKey::new(unbound);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let header = build_header(&salt, &nonce_bytes, params);
    let mut in_out = data.to_vec();
    in_out.reserve(aead::AES_256_GCM.tag_len());
    sealing_key
        .seal_in_place_append_tag(nonce, aead::Aad::from(&header), &mut in_out)
        .map_err(|_| anyhow!("encryption failed"))?;
    let mut out = header;
    out.extend_from_slice(&in_out);
    Ok(out)
}

pub fn open_with_key(data: &[u8], derived_key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    let (hdr, ct_offset) = parse_header(data).map_err(|e| anyhow!("invalid header: {e}"))?;
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, derived_key)
        .map_err(|_| anyhow!("failed to create opening key"))?;
    let opening_key = aead::LessSafeKey::new(unbound);
    let nonce = aead::Nonce::assume_unique_for_key(hdr.nonce);
    let aad = aead::Aad::from(&data[..ct_offset]);
    let mut in_out = data[ct_offset..].to_vec();
    let pt = opening_key
        .open_in_place(nonce, aad, &mut in_out)
        .map_err(|_| anyhow!("decryption failed (wrong password or corrupted data)"))?;
    Ok(pt.to_vec())
}

/// SHA-256 of `content` as lowercase hex.
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
