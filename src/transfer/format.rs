use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::TransferError;

/// Every file layout the converter knows about, in registration order.
/// Detection ties are broken by this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Format {
    BitwardenJson,
    BitwardenCsv,
    OnePassword1pif,
    OnePasswordCsv,
    LastPassCsv,
    KeePassCsv,
    KeePassKdbx,
    ChromeCsv,
    DashlaneCsv,
    DashlaneJson,
    Native,
}

#[derive(Debug, Serialize)]
pub struct FormatMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub extensions: &'static [&'static str],
    pub supports_import: bool,
    pub supports_export: bool,
    pub requires_password: bool,
    pub popular: bool,
    pub encrypted: bool,
    pub compatible_apps: &'static [&'static str],
}

impl Format {
    pub const ALL: [Format; 11] = [
        Format::BitwardenJson,
        Format::BitwardenCsv,
        Format::OnePassword1pif,
        Format::OnePasswordCsv,
        Format::LastPassCsv,
        Format::KeePassCsv,
        Format::KeePassKdbx,
        Format::ChromeCsv,
        Format::DashlaneCsv,
        Format::DashlaneJson,
        Format::Native,
    ];

    pub fn metadata(self) -> &'static FormatMetadata {
        match self {
            Format::BitwardenJson => &BITWARDEN_JSON,
            Format::BitwardenCsv => &BITWARDEN_CSV,
            Format::OnePassword1pif => &ONEPASSWORD_1PIF,
            Format::OnePasswordCsv => &ONEPASSWORD_CSV,
            Format::LastPassCsv => &LASTPASS_CSV,
            Format::KeePassCsv => &KEEPASS_CSV,
            Format::KeePassKdbx => &KEEPASS_KDBX,
            Format::ChromeCsv => &CHROME_CSV,
            Format::DashlaneCsv => &DASHLANE_CSV,
            Format::DashlaneJson => &DASHLANE_JSON,
            Format::Native => &NATIVE,
        }
    }

    pub fn id(self) -> &'static str {
        self.metadata().id
    }

    /// Preferred extension, without the leading dot.
    pub fn default_extension(self) -> &'static str {
        self.metadata().extensions[0].trim_start_matches('.')
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<Format> for &'static str {
    fn from(format: Format) -> Self {
        format.id()
    }
}

impl FromStr for Format {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Format::ALL
            .into_iter()
            .find(|f| f.id() == needle)
            .ok_or_else(|| TransferError::UnknownFormatId(s.to_string()))
    }
}

pub fn get_format_metadata(id: &str) -> Option<&'static FormatMetadata> {
    id.parse::<Format>().ok().map(Format::metadata)
}

pub fn import_formats() -> Vec<Format> {
    Format::ALL
        .into_iter()
        .filter(|f| f.metadata().supports_import)
        .collect()
}

pub fn export_formats() -> Vec<Format> {
    Format::ALL
        .into_iter()
        .filter(|f| f.metadata().supports_export)
        .collect()
}

pub fn popular_formats() -> Vec<Format> {
    Format::ALL
        .into_iter()
        .filter(|f| f.metadata().popular)
        .collect()
}

static BITWARDEN_JSON: FormatMetadata = FormatMetadata {
    id: "bitwarden-json",
    name: "Bitwarden (JSON)",
    description: "Export JSON non chiffré de Bitwarden, avec dossiers et favoris",
    extensions: &[".json"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: true,
    encrypted: false,
    compatible_apps: &["Bitwarden", "Vaultwarden"],
};

static BITWARDEN_CSV: FormatMetadata = FormatMetadata {
    id: "bitwarden-csv",
    name: "Bitwarden (CSV)",
    description: "Export CSV de Bitwarden (identifiants uniquement)",
    extensions: &[".csv"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: true,
    encrypted: false,
    compatible_apps: &["Bitwarden", "Vaultwarden"],
};

static ONEPASSWORD_1PIF: FormatMetadata = FormatMetadata {
    id: "1password-1pif",
    name: "1Password (1PIF)",
    description: "Format d'échange historique de 1Password",
    extensions: &[".1pif"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: false,
    encrypted: false,
    compatible_apps: &["1Password 4", "1Password 6", "1Password 7"],
};

static ONEPASSWORD_CSV: FormatMetadata = FormatMetadata {
    id: "1password-csv",
    name: "1Password (CSV)",
    description: "Export CSV de 1Password 8",
    extensions: &[".csv"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: true,
    encrypted: false,
    compatible_apps: &["1Password 8"],
};

static LASTPASS_CSV: FormatMetadata = FormatMetadata {
    id: "lastpass-csv",
    name: "LastPass (CSV)",
    description: "Export CSV de LastPass",
    extensions: &[".csv"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: true,
    encrypted: false,
    compatible_apps: &["LastPass"],
};

static KEEPASS_CSV: FormatMetadata = FormatMetadata {
    id: "keepass-csv",
    name: "KeePass (CSV)",
    description: "Export CSV de KeePass 2 et KeePassXC",
    extensions: &[".csv"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: false,
    encrypted: false,
    compatible_apps: &["KeePass 2", "KeePassXC", "KeePassDX"],
};

static KEEPASS_KDBX: FormatMetadata = FormatMetadata {
    id: "keepass-kdbx",
    name: "KeePass (KDBX)",
    description: "Base de données KeePass chiffrée (non prise en charge)",
    extensions: &[".kdbx"],
    supports_import: true,
    supports_export: false,
    requires_password: true,
    popular: false,
    encrypted: true,
    compatible_apps: &["KeePass 2", "KeePassXC", "KeePassDX"],
};

static CHROME_CSV: FormatMetadata = FormatMetadata {
    id: "chrome-csv",
    name: "Chrome / Edge (CSV)",
    description: "Mots de passe exportés depuis un navigateur Chromium",
    extensions: &[".csv"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: true,
    encrypted: false,
    compatible_apps: &["Google Chrome", "Microsoft Edge", "Brave", "Opera", "Vivaldi"],
};

static DASHLANE_CSV: FormatMetadata = FormatMetadata {
    id: "dashlane-csv",
    name: "Dashlane (CSV)",
    description: "Export CSV des identifiants Dashlane",
    extensions: &[".csv"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: false,
    encrypted: false,
    compatible_apps: &["Dashlane"],
};

static DASHLANE_JSON: FormatMetadata = FormatMetadata {
    id: "dashlane-json",
    name: "Dashlane (JSON)",
    description: "Export JSON des identifiants Dashlane",
    extensions: &[".json"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: false,
    encrypted: false,
    compatible_apps: &["Dashlane"],
};

static NATIVE: FormatMetadata = FormatMetadata {
    id: "passerelle-json",
    name: "Passerelle (JSON)",
    description: "Format natif, conserve tous les champs et peut être chiffré",
    extensions: &[".json"],
    supports_import: true,
    supports_export: true,
    requires_password: false,
    popular: true,
    encrypted: true,
    compatible_apps: &["Passerelle"],
};
