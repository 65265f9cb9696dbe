use crate::config::Config;
use crate::core::adapters::{EnvOrPromptPassword, FileByteStore, JsonCodec};
use crate::core::fs_secure::{atomic_write_secure, ensure_parent_secure, write_export};
use crate::core::ports::{ByteStore, EntryCodec, PasswordSource};
use crate::core::service::{MergeStrategy, VaultService};
use crate::transfer::cipher::{is_armored, open_export, xor_decode, ExportCipher};
use crate::transfer::detect::{detect_bytes, rank_formats};
use crate::transfer::error::TransferError;
use crate::transfer::format::{export_formats, import_formats, popular_formats, Format};
use crate::transfer::{self, export_entries, import_bytes, ExportRequest, ImportOutcome};
use anyhow::{anyhow, Context, Result};
use inquire::Password;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;

pub const EXPORT_PASSPHRASE_ENV: &str = "PASSERELLE_EXPORT_PASSPHRASE";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormatScope {
    All,
    Import,
    Export,
    Popular,
}

pub struct ImportArgs {
    pub file: PathBuf,
    pub format: Option<String>,
    pub preview: bool,
    pub strategy: MergeStrategy,
}

pub struct ExportArgs {
    pub format: String,
    pub out: Option<PathBuf>,
    pub stdout: bool,
    /// Falls back to the configured default.
    pub cipher: Option<ExportCipher>,
    pub username: Option<String>,
}

pub struct Vault<'a> {
    config: &'a Config,
    service: Arc<VaultService>,
}

fn export_passphrase(confirm: bool) -> Result<SecretString> {
    if let Ok(pass) = env::var(EXPORT_PASSPHRASE_ENV) {
        return Ok(SecretString::from(pass));
    }
    let prompt = Password::new("Phrase secrète de l'export");
    let prompt = if confirm {
        prompt.with_custom_confirmation_message("Confirmez la phrase secrète")
    } else {
        prompt.without_confirmation()
    };
    let pass = prompt.prompt().context("Failed to read export passphrase")?;
    Ok(SecretString::from(pass))
}

async fn read_file(path: PathBuf) -> Result<Vec<u8>> {
    let display = path.display().to_string();
    spawn_blocking(move || fs::read(&path))
        .await
        .map_err(|_| anyhow!("task join error"))?
        .with_context(|| format!("Failed to read {display}"))
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

fn print_outcome(outcome: &ImportOutcome) {
    let meta = outcome.format.metadata();
    println!("📥 Format : {} ({})", meta.name, meta.id);
    if outcome.was_encrypted {
        println!("🔓 Export chiffré ouvert");
    }
    let report = &outcome.report;
    println!(
        "✅ {} entrée(s) valide(s), {} ignorée(s)",
        report.entries.len(),
        report.skipped_count()
    );
    for skipped in &report.skipped {
        println!("  ⚠️ enregistrement {} : {}", skipped.record, skipped.reason);
    }
}

impl<'a> Vault<'a> {
    pub fn create(config: &'a Config) -> Self {
        let store: Arc<dyn ByteStore> = Arc::new(FileByteStore::new_with_backups(
            config.vault_path.clone(),
            config.backups,
        ));
        let codec: Arc<dyn EntryCodec> = Arc::new(JsonCodec);
        let passwords: Arc<dyn PasswordSource> = Arc::new(EnvOrPromptPassword::new());
        let service = Arc::new(VaultService::new(store, codec, passwords));

        Vault { config, service }
    }

    pub fn handle_formats(&self, scope: FormatScope, json_mode: bool) -> Result<()> {
        let formats: Vec<Format> = match scope {
            FormatScope::All => Format::ALL.to_vec(),
            FormatScope::Import => import_formats(),
            FormatScope::Export => export_formats(),
            FormatScope::Popular => popular_formats(),
        };

        if json_mode {
            let items: Vec<_> = formats.iter().map(|f| f.metadata()).collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        for f in formats {
            let meta = f.metadata();
            let mut caps = Vec::new();
            if meta.supports_import {
                caps.push("import");
            }
            if meta.supports_export {
                caps.push("export");
            }
            println!(
                "{:<16} {:<20} [{}] {}",
                meta.id,
                meta.name,
                caps.join("/"),
                meta.description
            );
        }
        Ok(())
    }

    pub async fn handle_detect(&self, file: PathBuf, json_mode: bool) -> Result<()> {
        let name = file_name_of(&file);
        let bytes = read_file(file).await?;
        let text = std::str::from_utf8(&bytes).ok();
        let armored = text.is_some_and(is_armored);
        let (detected, ranked) = if armored {
            (None, Vec::new())
        } else {
            let detected = detect_bytes(&bytes, name.as_deref());
            let ranked = text.map(rank_formats).unwrap_or_default();
            (detected, ranked)
        };

        if json_mode {
            let candidates: Vec<_> = ranked
                .iter()
                .map(|(f, score)| json!({"format": f.id(), "score": score}))
                .collect();
            let out = json!({
                "format": detected.map(Format::id),
                "encrypted": armored,
                "candidates": candidates,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            return Ok(());
        }

        if armored {
            println!("🔒 Export chiffré par passerelle (utilisez `passerelle import` ou `passerelle decrypt`)");
            return Ok(());
        }
        match detected {
            Some(f) => println!("🔎 Format détecté : {} ({})", f.metadata().name, f.id()),
            None => println!("❓ Format inconnu ; précisez --format"),
        }
        for (f, score) in ranked {
            println!("  {:<16} {score}", f.id());
        }
        Ok(())
    }

    pub async fn handle_import(&self, args: ImportArgs) -> Result<()> {
        let format = args
            .format
            .as_deref()
            .map(str::parse::<Format>)
            .transpose()?;
        let filename = file_name_of(&args.file);
        let bytes = read_file(args.file).await?;

        let mut opts = transfer::ImportOptions {
            format,
            filename,
            passphrase: env::var(EXPORT_PASSPHRASE_ENV).ok().map(SecretString::from),
            source_password: None,
        };
        let outcome = loop {
            match import_bytes(&bytes, &opts) {
                Ok(outcome) => break outcome,
                Err(TransferError::PassphraseRequired) if opts.passphrase.is_none() => {
                    opts.passphrase = Some(export_passphrase(false)?);
                }
                Err(TransferError::PasswordRequired(f)) if opts.source_password.is_none() => {
                    let pw = Password::new(&format!("Mot de passe du fichier {}", f.metadata().name))
                        .without_confirmation()
                        .prompt()
                        .context("Failed to read file password")?;
                    opts.source_password = Some(SecretString::from(pw));
                }
                Err(TransferError::UnknownFormat) => {
                    anyhow::bail!("format non reconnu ; précisez --format (voir `passerelle formats --import`)")
                }
                Err(e) => return Err(e.into()),
            }
        };

        print_outcome(&outcome);
        if args.preview {
            for e in &outcome.report.entries {
                println!("  {}\t{}\t{}", e.site_name, e.username, e.url_str());
            }
            return Ok(());
        }
        if outcome.report.entries.is_empty() {
            anyhow::bail!("aucune entrée importable dans ce fichier");
        }

        let svc = self.service.clone();
        let strategy = args.strategy;
        let entries = outcome.report.entries;
        let summary = spawn_blocking(move || svc.merge(entries, strategy))
            .await
            .map_err(|_| anyhow!("task join error"))??;
        println!(
            "✅ Import terminé : {} ajoutée(s), {} doublon(s) ignoré(s), {} au total",
            summary.added, summary.skipped_duplicates, summary.total
        );
        Ok(())
    }

    pub async fn handle_export(&self, args: ExportArgs) -> Result<()> {
        let format: Format = args.format.parse()?;
        if !format.metadata().supports_export {
            return Err(TransferError::ExportNotSupported(format).into());
        }
        let cipher = args.cipher.unwrap_or(self.config.default_encryption);

        let svc = self.service.clone();
        let entries = spawn_blocking(move || svc.load())
            .await
            .map_err(|_| anyhow!("task join error"))??;
        if entries.is_empty() {
            anyhow::bail!("le coffre est vide, rien à exporter");
        }

        let passphrase = if cipher.is_encrypted() {
            Some(export_passphrase(true)?)
        } else {
            None
        };
        let app_name = self.config.app_name.clone();
        let username = args.username.or_else(|| self.config.username.clone());
        let artifact = spawn_blocking(move || {
            let mut req = ExportRequest::new(format, &app_name);
            req.cipher = cipher;
            req.passphrase = passphrase.as_ref().map(|p| p.expose_secret());
            req.username = username.as_deref();
            export_entries(&entries, &req)
        })
        .await
        .map_err(|_| anyhow!("task join error"))??;

        if args.stdout {
            print!("{}", artifact.content);
            eprintln!("✅ {} entrée(s) exportée(s) au format {}", artifact.count, format.id());
            return Ok(());
        }

        let dir = args.out.unwrap_or_else(|| self.config.export_dir.clone());
        let file_name = artifact.file_name.clone();
        let content = artifact.content;
        let path = spawn_blocking(move || write_export(&dir, &file_name, &content))
            .await
            .map_err(|_| anyhow!("task join error"))??;
        println!("✅ {} entrée(s) exportée(s) vers {}", artifact.count, path.display());
        println!("   SHA-256 : {}", artifact.digest);
        if cipher == ExportCipher::LegacyXor {
            println!("⚠️ XOR est une simple obfuscation, pas un chiffrement");
        }
        Ok(())
    }

    pub async fn handle_decrypt(
        &self,
        file: PathBuf,
        legacy_xor: bool,
        out: Option<PathBuf>,
    ) -> Result<()> {
        let bytes = read_file(file).await?;
        let text = String::from_utf8(bytes).map_err(|_| TransferError::NotText)?;
        if !legacy_xor && !is_armored(&text) {
            anyhow::bail!("ce fichier n'est pas un export chiffré (essayez --legacy-xor)");
        }
        let passphrase = export_passphrase(false)?;
        let plain = spawn_blocking(move || {
            if legacy_xor {
                xor_decode(&text, passphrase.expose_secret())
            } else {
                open_export(&text, passphrase.expose_secret())
            }
        })
        .await
        .map_err(|_| anyhow!("task join error"))??;

        match out {
            Some(path) => {
                let shown = path.display().to_string();
                spawn_blocking(move || -> Result<()> {
                    ensure_parent_secure(&path)?;
                    atomic_write_secure(&path, plain.as_bytes())
                })
                .await
                .map_err(|_| anyhow!("task join error"))??;
                println!("🔓 Export déchiffré vers {shown}");
            }
            None => print!("{plain}"),
        }
        Ok(())
    }

    pub async fn handle_list(&self, query: Option<String>, json_mode: bool) -> Result<()> {
        let svc = self.service.clone();
        let mut entries = spawn_blocking(move || svc.load())
            .await
            .map_err(|_| anyhow!("task join error"))??;

        if let Some(q) = query {
            let ql = q.to_lowercase();
            entries.retain(|e| {
                e.site_name.to_lowercase().contains(&ql)
                    || e.url_str().to_lowercase().contains(&ql)
                    || e.username.to_lowercase().contains(&ql)
            });
        }

        if json_mode {
            // No secrets in listings
            let items: Vec<serde_json::Value> = entries
                .iter()
                .map(|e| {
                    json!({
                        "id": e.id,
                        "siteName": e.site_name,
                        "siteUrl": e.site_url,
                        "username": e.username,
                        "category": e.category,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("(vide)");
            return Ok(());
        }
        for e in entries {
            if e.username.is_empty() {
                println!("{}", e.site_name);
            } else {
                println!("{}\t{}", e.site_name, e.username);
            }
        }
        Ok(())
    }
}
