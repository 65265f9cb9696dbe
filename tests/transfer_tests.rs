use passerelle::core::crypto::{content_digest, KdfParams};
use passerelle::transfer::cipher::{is_armored, xor_decode, ExportCipher};
use passerelle::transfer::entry::PasswordEntry;
use passerelle::transfer::error::TransferError;
use passerelle::transfer::format::Format;
use passerelle::transfer::{export_entries, import_bytes, ExportRequest, ImportOptions, EXPORT_MIME_TYPE};
use secrecy::SecretString;

const FAST: KdfParams = KdfParams {
    m_cost_kib: 1024,
    t_cost: 1,
    p_lanes: 1,
};

fn entries() -> Vec<PasswordEntry> {
    vec![
        PasswordEntry::new("GitHub", "alice", "S3cr3t!").with_url("https://github.com"),
        PasswordEntry::new("Banque", "bob", "p@ss,1"),
    ]
}

#[test]
fn plain_export_is_named_and_fingerprinted() {
    let mut req = ExportRequest::new(Format::ChromeCsv, "Passerelle");
    req.username = Some("Élodie");
    let artifact = export_entries(&entries(), &req).unwrap();
    assert_eq!(artifact.count, 2);
    assert_eq!(artifact.mime_type, EXPORT_MIME_TYPE);
    assert!(artifact.file_name.starts_with("passerelle_elodie_chrome-csv_2-entrees_"));
    assert!(artifact.file_name.ends_with(".csv"));
    assert!(!artifact.file_name.contains("encrypted"));
    assert_eq!(artifact.digest, content_digest(artifact.content.as_bytes()));
}

#[test]
fn sealed_export_imports_back_with_passphrase() {
    let mut req = ExportRequest::new(Format::BitwardenCsv, "passerelle");
    req.cipher = ExportCipher::Aead;
    req.passphrase = Some("phrase secrète");
    req.kdf = FAST;
    let artifact = export_entries(&entries(), &req).unwrap();
    assert!(is_armored(&artifact.content));
    assert!(artifact.file_name.ends_with("_encrypted.csv"));

    let no_pass = ImportOptions::default();
    let err = import_bytes(artifact.content.as_bytes(), &no_pass).unwrap_err();
    assert!(matches!(err, TransferError::PassphraseRequired));

    let opts = ImportOptions {
        filename: Some(artifact.file_name.clone()),
        passphrase: Some(SecretString::from("phrase secrète".to_string())),
        ..ImportOptions::default()
    };
    let outcome = import_bytes(artifact.content.as_bytes(), &opts).unwrap();
    assert!(outcome.was_encrypted);
    assert_eq!(outcome.format, Format::BitwardenCsv);
    assert_eq!(outcome.report.entries.len(), 2);
    assert_eq!(outcome.report.entries[1].password_str(), "p@ss,1");

    let wrong = ImportOptions {
        passphrase: Some(SecretString::from("autre".to_string())),
        ..ImportOptions::default()
    };
    assert!(matches!(
        import_bytes(artifact.content.as_bytes(), &wrong),
        Err(TransferError::Cipher(_))
    ));
}

#[test]
fn legacy_xor_export_decodes_to_the_plain_body() {
    let plain = export_entries(&entries(), &ExportRequest::new(Format::LastPassCsv, "p"))
        .unwrap()
        .content;
    let mut req = ExportRequest::new(Format::LastPassCsv, "p");
    req.cipher = ExportCipher::LegacyXor;
    req.passphrase = Some("clé");
    let artifact = export_entries(&entries(), &req).unwrap();
    assert_ne!(artifact.content, plain);
    assert_eq!(xor_decode(&artifact.content, "clé").unwrap(), plain);
}

#[test]
fn encryption_without_passphrase_is_refused() {
    let mut req = ExportRequest::new(Format::Native, "p");
    req.cipher = ExportCipher::Aead;
    assert!(matches!(
        export_entries(&entries(), &req),
        Err(TransferError::PassphraseRequired)
    ));
}

#[test]
fn kdbx_asks_for_a_password_then_reports_unsupported() {
    let bytes = [0x03, 0xd9, 0xa2, 0x9a, 0x67, 0xfb, 0x4b, 0xb5, 0x01, 0x00];
    let err = import_bytes(&bytes, &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, TransferError::PasswordRequired(Format::KeePassKdbx)));

    let opts = ImportOptions {
        source_password: Some(SecretString::from("master".to_string())),
        ..ImportOptions::default()
    };
    let err = import_bytes(&bytes, &opts).unwrap_err();
    assert!(matches!(err, TransferError::Unsupported(Format::KeePassKdbx)));

    let req = ExportRequest::new(Format::KeePassKdbx, "p");
    assert!(matches!(
        export_entries(&entries(), &req),
        Err(TransferError::ExportNotSupported(Format::KeePassKdbx))
    ));
}

#[test]
fn import_rejects_empty_binary_and_unknown_input() {
    let opts = ImportOptions::default();
    assert!(matches!(import_bytes(b"", &opts), Err(TransferError::EmptyInput)));
    assert!(matches!(import_bytes(&[0xff, 0xfe, 0x41], &opts), Err(TransferError::NotText)));
    assert!(matches!(
        import_bytes(b"just some prose", &opts),
        Err(TransferError::UnknownFormat)
    ));
}

#[test]
fn explicit_format_skips_detection() {
    let content = "\u{feff}name,url,username,password\nBank,https://bank.example,bob,pw";
    let opts = ImportOptions {
        format: Some(Format::LastPassCsv),
        ..ImportOptions::default()
    };
    let outcome = import_bytes(content.as_bytes(), &opts).unwrap();
    assert_eq!(outcome.format, Format::LastPassCsv);
    assert_eq!(outcome.report.entries[0].site_name, "Bank");

    let detected = import_bytes(content.as_bytes(), &ImportOptions::default()).unwrap();
    assert_eq!(detected.format, Format::ChromeCsv);
}
