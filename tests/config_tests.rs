use passerelle::config::{Config, ConfigError};
use passerelle::transfer::cipher::ExportCipher;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const VARS: &[&str] = &[
    "PASSERELLE_VAULT_PATH",
    "PASSERELLE_BACKUPS",
    "PASSERELLE_APP_NAME",
    "PASSERELLE_USERNAME",
    "PASSERELLE_EXPORT_DIR",
    "PASSERELLE_ENCRYPTION",
    "PASSERELLE_LOG",
    "RUST_LOG",
    "PASSERELLE_DATA_DIR",
];

/// Points the config dir at `dir` and clears every other override.
fn isolate(dir: &Path) {
    for var in VARS {
        env::remove_var(var);
    }
    env::set_var("PASSERELLE_CONFIG_DIR", dir.join("cfg"));
}

fn write_config_file(dir: &Path, content: &str) {
    let cfg_dir = dir.join("cfg").join("passerelle");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("config.toml"), content).expect("write config file");
}

#[test]
#[serial]
fn vault_path_precedence_cli_over_env_and_file() {
    let td = tempdir().unwrap();
    isolate(td.path());
    write_config_file(td.path(), "vault_path = \"/tmp/cfg_vault.psrl\"\n");
    env::set_var("PASSERELLE_VAULT_PATH", "/tmp/env_vault.psrl");

    let cli_path = PathBuf::from("/tmp/cli_vault.psrl");
    let cfg = Config::create(Some(cli_path.clone())).unwrap();
    assert_eq!(cfg.vault_path, cli_path);

    let cfg = Config::create(None).unwrap();
    assert_eq!(cfg.vault_path, PathBuf::from("/tmp/env_vault.psrl"));

    env::remove_var("PASSERELLE_VAULT_PATH");
    let cfg = Config::create(None).unwrap();
    assert_eq!(cfg.vault_path, PathBuf::from("/tmp/cfg_vault.psrl"));
}

#[test]
#[serial]
fn defaults_apply_without_file_or_env() {
    let td = tempdir().unwrap();
    isolate(td.path());
    env::set_var("PASSERELLE_DATA_DIR", td.path().join("data"));

    let cfg = Config::create(None).unwrap();
    assert_eq!(
        cfg.vault_path,
        td.path().join("data").join("passerelle").join("vault.psrl")
    );
    assert_eq!(cfg.backups, 2);
    assert_eq!(cfg.app_name, "passerelle");
    assert_eq!(cfg.username, None);
    assert_eq!(cfg.export_dir, PathBuf::from("."));
    assert_eq!(cfg.default_encryption, ExportCipher::None);
    assert_eq!(cfg.log_filter, "passerelle=warn");
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let td = tempdir().unwrap();
    isolate(td.path());
    write_config_file(
        td.path(),
        "backups = 4\napp_name = \"Coffre\"\nencryption = \"xor\"\nlog = \"passerelle=info\"\n",
    );

    let cfg = Config::create(None).unwrap();
    assert_eq!(cfg.backups, 4);
    assert_eq!(cfg.app_name, "Coffre");
    assert_eq!(cfg.default_encryption, ExportCipher::LegacyXor);
    assert_eq!(cfg.log_filter, "passerelle=info");

    env::set_var("PASSERELLE_BACKUPS", "7");
    env::set_var("PASSERELLE_APP_NAME", "Suite");
    env::set_var("PASSERELLE_ENCRYPTION", "aead");
    env::set_var("PASSERELLE_LOG", "passerelle=debug");
    env::set_var("PASSERELLE_USERNAME", "marie");
    let cfg = Config::create(None).unwrap();
    assert_eq!(cfg.backups, 7);
    assert_eq!(cfg.app_name, "Suite");
    assert_eq!(cfg.default_encryption, ExportCipher::Aead);
    assert_eq!(cfg.log_filter, "passerelle=debug");
    assert_eq!(cfg.username.as_deref(), Some("marie"));

    // Unparseable numbers fall back to the next layer
    env::set_var("PASSERELLE_BACKUPS", "many");
    assert_eq!(Config::create(None).unwrap().backups, 4);
}

#[test]
#[serial]
fn invalid_values_are_reported() {
    let td = tempdir().unwrap();
    isolate(td.path());
    env::set_var("PASSERELLE_ENCRYPTION", "rot13");
    assert!(matches!(
        Config::create(None),
        Err(ConfigError::InvalidEncryption(v)) if v == "rot13"
    ));

    env::remove_var("PASSERELLE_ENCRYPTION");
    write_config_file(td.path(), "backups = \"deux\"\n");
    assert!(matches!(Config::create(None), Err(ConfigError::Parse { .. })));
}
