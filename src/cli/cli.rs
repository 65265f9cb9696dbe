use clap::{Args, Parser, Subcommand, ValueEnum};

const PASSERELLE_LONG_VERSION: &str = concat!(
"version: ", env!("CARGO_PKG_VERSION"), "\n",
"git sha: ", env!("PASSERELLE_GIT_SHA"), "\n",
"build time (UTC): ", env!("PASSERELLE_BUILD_TIME"), "\n",
"target: ", env!("PASSERELLE_TARGET")
);

#[derive(Parser)]
#[command(
    name = "passerelle",
    version = env!("CARGO_PKG_VERSION"),
    long_version = PASSERELLE_LONG_VERSION,
    about = "🔁 Passerelle : import/export de mots de passe entre gestionnaires"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the supported file formats
    Formats {
        #[command(flatten)]
        filter: FormatFilter,
        /// Output JSON (machine-readable)
        #[arg(long)]
        json: bool,
    },
    /// Detect the format of a file and show candidate scores
    Detect {
        file: String,
        #[arg(long)]
        json: bool,
    },
    /// Import a file into the encrypted store
    Import {
        file: String,
        /// Format identifier; skips detection
        #[arg(long)]
        format: Option<String>,
        /// Show what would be imported without touching the store
        #[arg(long)]
        preview: bool,
        #[arg(long, value_enum, default_value = "skip-duplicates")]
        strategy: StrategyArg,
        /// Store file path override
        #[arg(long)]
        path: Option<String>,
    },
    /// Export the store content to another format
    Export {
        /// Format identifier (see `passerelle formats --export`)
        #[arg(long)]
        format: String,
        /// Output directory (overrides PASSERELLE_EXPORT_DIR)
        #[arg(long)]
        out: Option<String>,
        /// Print the export to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
        /// Protection applied to the export (overrides PASSERELLE_ENCRYPTION)
        #[arg(long, value_enum)]
        encrypt: Option<CipherArg>,
        /// Username part of the generated file name
        #[arg(long)]
        username: Option<String>,
        /// Store file path override
        #[arg(long)]
        path: Option<String>,
    },
    /// Decrypt an export produced with --encrypt
    Decrypt {
        file: String,
        /// The file uses the legacy XOR scheme
        #[arg(long)]
        legacy_xor: bool,
        /// Write the plaintext to this file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
    /// List stored entries (never prints passwords)
    List {
        /// Filter by site, URL or username (case-insensitive)
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        json: bool,
        /// Store file path override
        #[arg(long)]
        path: Option<String>,
    },
}

#[derive(Args, Clone, Copy, Debug, Default)]
#[group(multiple = false)]
pub struct FormatFilter {
    /// Only formats that can be imported
    #[arg(long)]
    pub import: bool,
    /// Only formats that can be exported
    #[arg(long)]
    pub export: bool,
    /// Only popular formats
    #[arg(long)]
    pub popular: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum StrategyArg {
    Append,
    SkipDuplicates,
    Replace,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum CipherArg {
    Aead,
    Xor,
    None,
}
