use passerelle::core::adapters::{FileByteStore, JsonCodec, StaticPassword};
use passerelle::core::crypto::{KdfParams, HEADER_MAGIC};
use passerelle::core::service::{MergeStrategy, VaultService};
use passerelle::transfer::entry::PasswordEntry;
use secrecy::SecretString;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const FAST: KdfParams = KdfParams {
    m_cost_kib: 1024,
    t_cost: 1,
    p_lanes: 1,
};

fn service(path: &Path, password: &str, backups: usize) -> VaultService {
    let store = Arc::new(FileByteStore::new_with_backups(path.to_path_buf(), backups));
    let codec = Arc::new(JsonCodec);
    let passwords = Arc::new(StaticPassword(SecretString::from(password.to_string())));
    VaultService::new(store, codec, passwords).with_kdf_params(FAST)
}

#[test]
fn merge_then_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.psrl");
    let svc = service(&path, "svcpass", 2);

    assert!(svc.load().unwrap().is_empty());

    let summary = svc
        .merge(
            vec![PasswordEntry::new("GitHub", "alice", "S3cr3t!")],
            MergeStrategy::SkipDuplicates,
        )
        .unwrap();
    assert_eq!((summary.added, summary.total), (1, 1));

    let loaded = svc.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].password_str(), "S3cr3t!");

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(HEADER_MAGIC));
    assert!(!String::from_utf8_lossy(&bytes).contains("S3cr3t!"));
}

#[test]
fn importing_twice_skips_duplicates() {
    let dir = tempdir().unwrap();
    let svc = service(&dir.path().join("vault.psrl"), "pw", 2);
    let batch = || vec![PasswordEntry::new("GitHub", "alice", "S3cr3t!")];
    svc.merge(batch(), MergeStrategy::SkipDuplicates).unwrap();
    let second = svc.merge(batch(), MergeStrategy::SkipDuplicates).unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.skipped_duplicates, 1);
    assert_eq!(second.total, 1);

    let replaced = svc
        .merge(vec![PasswordEntry::new("Mail", "eve", "x")], MergeStrategy::Replace)
        .unwrap();
    assert_eq!(replaced.total, 1);
    assert_eq!(svc.load().unwrap()[0].site_name, "Mail");
}

#[test]
fn wrong_password_cannot_read_or_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.psrl");
    service(&path, "right", 2)
        .merge(vec![PasswordEntry::new("A", "u", "p")], MergeStrategy::Append)
        .unwrap();
    let before = std::fs::read(&path).unwrap();

    let intruder = service(&path, "wrong", 2);
    assert!(intruder.load().is_err());
    assert!(intruder
        .merge(vec![PasswordEntry::new("B", "u", "p")], MergeStrategy::Replace)
        .is_err());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn plaintext_store_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.psrl");
    std::fs::write(&path, br#"{"entries":[]}"#).unwrap();
    let err = service(&path, "pw", 2).load().unwrap_err();
    assert!(err.to_string().contains("plaintext is not allowed"));
}

#[test]
fn saves_rotate_backups() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.psrl");
    let svc = service(&path, "pw", 2);
    for i in 0..4 {
        svc.merge(
            vec![PasswordEntry::new(format!("Site {i}"), "u", "p")],
            MergeStrategy::Append,
        )
        .unwrap();
    }
    assert!(path.exists());
    assert!(dir.path().join("vault.psrl.1").exists());
    assert!(dir.path().join("vault.psrl.2").exists());
    assert!(!dir.path().join("vault.psrl.3").exists());

    // The newest backup is the previous generation and opens with the same password
    let previous = service(&dir.path().join("vault.psrl.1"), "pw", 0);
    assert_eq!(previous.load().unwrap().len(), 3);
}
