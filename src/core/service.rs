use crate::core::crypto::{
    derive_key_argon2id, open_with_key, parse_header, seal_with_key, KdfParams, HEADER_MAGIC,
    SALT_LEN,
};
use crate::core::ports::{ByteStore, EntryCodec, PasswordSource};
use crate::transfer::entry::PasswordEntry;
use anyhow::{anyhow, Context, Result};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use zeroize::Zeroize;

/// How imported entries are combined with the store content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    Append,
    /// Drops entries whose id is already stored, or whose site, username and
    /// password match a stored entry.
    #[default]
    SkipDuplicates,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub added: usize,
    pub skipped_duplicates: usize,
    pub total: usize,
}

fn identity(e: &PasswordEntry) -> (String, String, String) {
    (
        e.site_name.trim().to_lowercase(),
        e.username.trim().to_string(),
        e.password_str().to_string(),
    )
}

pub fn merge_entries(
    existing: &mut Vec<PasswordEntry>,
    incoming: Vec<PasswordEntry>,
    strategy: MergeStrategy,
) -> MergeSummary {
    let mut summary = MergeSummary::default();
    match strategy {
        MergeStrategy::Replace => {
            summary.added = incoming.len();
            *existing = incoming;
        }
        MergeStrategy::Append => {
            summary.added = incoming.len();
            existing.extend(incoming);
        }
        MergeStrategy::SkipDuplicates => {
            let mut ids: HashSet<String> = existing.iter().map(|e| e.id.clone()).collect();
            let mut seen: HashSet<_> = existing.iter().map(identity).collect();
            for entry in incoming {
                let key = identity(&entry);
                if ids.contains(&entry.id) || seen.contains(&key) {
                    summary.skipped_duplicates += 1;
                    continue;
                }
                ids.insert(entry.id.clone());
                seen.insert(key);
                existing.push(entry);
                summary.added += 1;
            }
        }
    }
    summary.total = existing.len();
    summary
}

pub struct VaultService {
    store: Arc<dyn ByteStore>,
    codec: Arc<dyn EntryCodec>,
    passwords: Arc<dyn PasswordSource>,
    kdf: KdfParams,
}

impl VaultService {
    pub fn new(
        store: Arc<dyn ByteStore>,
        codec: Arc<dyn EntryCodec>,
        passwords: Arc<dyn PasswordSource>,
    ) -> Self {
        Self {
            store,
            codec,
            passwords,
            kdf: KdfParams::default(),
        }
    }

    /// Parameters used when a new store is created.
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn load(&self) -> Result<Vec<PasswordEntry>> {
        let bytes = self.store.read()?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        if !bytes.starts_with(HEADER_MAGIC) {
            anyhow::bail!("unsupported store format: missing PSRL header (plaintext is not allowed)");
        }
        let (hdr, _) = parse_header(&bytes).map_err(|e| anyhow!("invalid header: {e}"))?;
        let pw = self.passwords.master_password()?;
        let mut key = derive_key_argon2id(pw.expose_secret(), &hdr.salt, hdr.params)?;
        let pt = open_with_key(&bytes, &key);
        key.zeroize();
        let mut pt = pt.context("Failed to decrypt store (wrong password?)")?;
        let entries = self.codec.decode(&pt);
        pt.zeroize();
        entries
    }

    pub fn save(&self, entries: &[PasswordEntry]) -> Result<()> {
        let mut plain = self.codec.encode(entries)?;
        let bytes = self.store.read()?;
        // Reuse salt and params of an existing store; the nonce is always fresh.
        let (params, salt) = if bytes.is_empty() {
            let mut salt = [0u8; SALT_LEN];
            SystemRandom::new()
                .fill(&mut salt)
                .map_err(|_| anyhow!("failed to generate salt"))?;
            (self.kdf, salt)
        } else {
            let (hdr, _) = parse_header(&bytes).map_err(|e| anyhow!("invalid header: {e}"))?;
            (hdr.params, hdr.salt)
        };
        let pw = self.passwords.master_password()?;
        let mut key = derive_key_argon2id(pw.expose_secret(), &salt, params)?;
        let ct = seal_with_key(&plain, params, salt, &key);
        key.zeroize();
        plain.zeroize();
        self.store.write(&ct?)
    }

    pub fn merge(&self, incoming: Vec<PasswordEntry>, strategy: MergeStrategy) -> Result<MergeSummary> {
        // Loading first also proves the password before anything is overwritten.
        let mut entries = self.load()?;
        let summary = merge_entries(&mut entries, incoming, strategy);
        self.save(&entries)?;
        tracing::info!(
            added = summary.added,
            skipped = summary.skipped_duplicates,
            total = summary.total,
            "store updated"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(site: &str, user: &str, pw: &str) -> PasswordEntry {
        PasswordEntry::new(site, user, pw)
    }

    #[test]
    fn skip_duplicates_matches_case_insensitive_site() {
        let mut existing = vec![entry("GitHub", "alice", "pw")];
        let summary = merge_entries(
            &mut existing,
            vec![entry("github", "alice", "pw"), entry("GitHub", "alice", "other")],
            MergeStrategy::SkipDuplicates,
        );
        assert_eq!(
            summary,
            MergeSummary {
                added: 1,
                skipped_duplicates: 1,
                total: 2
            }
        );
    }

    #[test]
    fn skip_duplicates_matches_ids_and_repeats_within_batch() {
        let first = entry("A", "u", "1");
        let mut same_id = entry("B", "v", "2");
        same_id.id = first.id.clone();
        let mut existing = vec![first];
        let summary = merge_entries(
            &mut existing,
            vec![same_id, entry("C", "w", "3"), entry("C", "w", "3")],
            MergeStrategy::SkipDuplicates,
        );
        assert_eq!(summary.added, 1);
        assert_eq!(summary.skipped_duplicates, 2);
    }

    #[test]
    fn append_and_replace() {
        let mut existing = vec![entry("A", "u", "1")];
        let s = merge_entries(&mut existing, vec![entry("A", "u", "1")], MergeStrategy::Append);
        assert_eq!((s.added, s.total), (1, 2));
        let s = merge_entries(&mut existing, vec![entry("Z", "z", "z")], MergeStrategy::Replace);
        assert_eq!((s.added, s.total), (1, 1));
        assert_eq!(existing[0].site_name, "Z");
    }
}
