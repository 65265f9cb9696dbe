use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const BITWARDEN_CSV: &str = "folder,favorite,type,name,notes,fields,reprompt,login_uri,login_username,login_password,login_totp\n\
,,login,GitHub,,,0,https://github.com,alice,S3cr3t!,\n";

/// A `passerelle` command isolated from the user's config and environment.
fn passerelle(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("passerelle").unwrap();
    for var in [
        "PASSERELLE_VAULT_PATH",
        "PASSERELLE_BACKUPS",
        "PASSERELLE_EXPORT_DIR",
        "PASSERELLE_ENCRYPTION",
        "PASSERELLE_USERNAME",
        "PASSERELLE_APP_NAME",
        "PASSERELLE_LOG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("PASSERELLE_CONFIG_DIR", home.join("cfg"))
        .env("PASSERELLE_DATA_DIR", home.join("data"))
        .env("PASSERELLE_PASSWORD", "maître")
        .env("PASSERELLE_EXPORT_PASSPHRASE", "phrase de test");
    cmd
}

fn setup() -> (TempDir, String, String) {
    let td = tempdir().unwrap();
    let source = td.path().join("bitwarden_export.csv");
    fs::write(&source, BITWARDEN_CSV).unwrap();
    let vault = td.path().join("vault.psrl");
    (
        td,
        source.to_string_lossy().into_owned(),
        vault.to_string_lossy().into_owned(),
    )
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).expect("stdout is JSON")
}

#[test]
fn formats_lists_all_and_exportable() {
    let td = tempdir().unwrap();
    let all = json_stdout(passerelle(td.path()).args(["formats", "--json"]));
    assert_eq!(all.as_array().unwrap().len(), 11);

    let export = json_stdout(passerelle(td.path()).args(["formats", "--export", "--json"]));
    let export = export.as_array().unwrap();
    assert_eq!(export.len(), 10);
    assert!(export.iter().all(|f| f["id"] != "keepass-kdbx"));

    passerelle(td.path())
        .args(["formats", "--import", "--export"])
        .assert()
        .failure();
}

#[test]
fn detect_reports_the_format_and_scores() {
    let (td, source, _) = setup();
    let report = json_stdout(passerelle(td.path()).args(["detect", source.as_str(), "--json"]));
    assert_eq!(report["format"], "bitwarden-csv");
    assert_eq!(report["encrypted"], false);
    assert_eq!(report["candidates"][0]["format"], "bitwarden-csv");
}

#[test]
fn preview_leaves_the_store_untouched() {
    let (td, source, vault) = setup();
    passerelle(td.path())
        .args(["import", source.as_str(), "--preview", "--path", vault.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub\talice\thttps://github.com"));
    assert!(!Path::new(&vault).exists());
}

#[test]
fn import_then_list_and_reimport() {
    let (td, source, vault) = setup();
    passerelle(td.path())
        .args(["import", source.as_str(), "--path", vault.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Import terminé : 1 ajoutée(s)"));

    passerelle(td.path())
        .args(["import", source.as_str(), "--path", vault.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 ajoutée(s), 1 doublon(s)"));

    let listed = json_stdout(passerelle(td.path()).args(["list", "--json", "--path", vault.as_str()]));
    let items = listed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["siteName"], "GitHub");
    assert_eq!(items[0]["username"], "alice");
    assert!(items[0].get("password").is_none());

    passerelle(td.path())
        .args(["list", "--query", "nothing-matches", "--path", vault.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("(vide)"));
}

#[test]
fn export_to_stdout_and_sealed_file() {
    let (td, source, vault) = setup();
    passerelle(td.path())
        .args(["import", source.as_str(), "--path", vault.as_str()])
        .assert()
        .success();

    passerelle(td.path())
        .args(["export", "--format", "chrome-csv", "--stdout", "--path", vault.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\"GitHub\",\"https://github.com\",\"alice\",\"S3cr3t!\"",
        ));

    let out_dir = td.path().join("exports");
    passerelle(td.path())
        .args(["export", "--format", "chrome-csv", "--encrypt", "aead", "--path", vault.as_str()])
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("SHA-256"));

    let written: Vec<_> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("_encrypted.csv"), "{name}");
    assert!(!fs::read_to_string(&written[0]).unwrap().contains("S3cr3t!"));

    passerelle(td.path())
        .arg("decrypt")
        .arg(&written[0])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("\"name\",\"url\",\"username\",\"password\""));
}

#[test]
fn empty_store_has_nothing_to_export() {
    let td = tempdir().unwrap();
    let vault = td.path().join("vault.psrl");
    passerelle(td.path())
        .args(["export", "--format", "passerelle-json", "--stdout", "--path"])
        .arg(&vault)
        .assert()
        .failure()
        .stderr(predicate::str::contains("rien à exporter"));
}

#[test]
fn missing_file_is_reported() {
    let td = tempdir().unwrap();
    passerelle(td.path())
        .args(["detect", "/definitely/not/here.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("❌ Erreur"));
}
