#![allow(clippy::module_inception)]
use crate::cli::cli::{CipherArg, Cli, Commands, StrategyArg};
use crate::config::Config;
use crate::core::logging;
use crate::core::service::MergeStrategy;
use crate::transfer::cipher::ExportCipher;
use crate::vault::{ExportArgs, FormatScope, ImportArgs, Vault};
use clap::Parser;
use std::path::PathBuf;

mod cli;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path_override = match &cli.command {
        Commands::Import { path, .. } | Commands::Export { path, .. } | Commands::List { path, .. } => {
            path.clone().map(PathBuf::from)
        }
        _ => None,
    };
    let config = Config::create(path_override)?;
    logging::init(&config.log_filter);
    let vault = Vault::create(&config);

    match cli.command {
        Commands::Formats { filter, json } => {
            let scope = if filter.import {
                FormatScope::Import
            } else if filter.export {
                FormatScope::Export
            } else if filter.popular {
                FormatScope::Popular
            } else {
                FormatScope::All
            };
            vault.handle_formats(scope, json)?;
        }
        Commands::Detect { file, json } => {
            vault.handle_detect(PathBuf::from(file), json).await?;
        }
        Commands::Import {
            file,
            format,
            preview,
            strategy,
            ..
        } => {
            let opts = ImportArgs {
                file: PathBuf::from(file),
                format,
                preview,
                strategy: match strategy {
                    StrategyArg::Append => MergeStrategy::Append,
                    StrategyArg::SkipDuplicates => MergeStrategy::SkipDuplicates,
                    StrategyArg::Replace => MergeStrategy::Replace,
                },
            };
            vault.handle_import(opts).await?;
        }
        Commands::Export {
            format,
            out,
            stdout,
            encrypt,
            username,
            ..
        } => {
            let opts = ExportArgs {
                format,
                out: out.map(PathBuf::from),
                stdout,
                cipher: encrypt.map(|c| match c {
                    CipherArg::Aead => ExportCipher::Aead,
                    CipherArg::Xor => ExportCipher::LegacyXor,
                    CipherArg::None => ExportCipher::None,
                }),
                username,
            };
            vault.handle_export(opts).await?;
        }
        Commands::Decrypt {
            file,
            legacy_xor,
            out,
        } => {
            vault
                .handle_decrypt(PathBuf::from(file), legacy_xor, out.map(PathBuf::from))
                .await?;
        }
        Commands::List { query, json, .. } => {
            vault.handle_list(query, json).await?;
        }
    }

    Ok(())
}
