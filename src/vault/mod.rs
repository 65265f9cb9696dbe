mod handlers;

pub use handlers::{ExportArgs, FormatScope, ImportArgs, Vault, EXPORT_PASSPHRASE_ENV};
