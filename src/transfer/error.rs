use thiserror::Error;

use super::format::Format;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("input is empty")]
    EmptyInput,
    #[error("invalid JSON for {format}: {source}")]
    InvalidJson {
        format: Format,
        #[source]
        source: serde_json::Error,
    },
    #[error("{format} header is missing required column(s): {missing}")]
    MissingHeaders { format: Format, missing: String },
    #[error("{0} content does not match the expected layout")]
    UnexpectedLayout(Format),
    #[error("{0} import is not supported")]
    Unsupported(Format),
    #[error("{0} export is not supported")]
    ExportNotSupported(Format),
    #[error("{0} file is encrypted by its vendor; export it unencrypted and retry")]
    EncryptedSource(Format),
    #[error("{0} requires a password to be opened")]
    PasswordRequired(Format),
    #[error("this export is encrypted; a passphrase is required")]
    PassphraseRequired,
    #[error("input is not valid UTF-8 text")]
    NotText,
    #[error("could not determine the file format")]
    UnknownFormat,
    #[error("unknown format identifier \"{0}\"")]
    UnknownFormatId(String),
    #[error("encryption error: {0}")]
    Cipher(String),
    #[error("failed to serialize {format}: {source}")]
    Serialize {
        format: Format,
        #[source]
        source: serde_json::Error,
    },
}
