use anyhow::Result;
use secrecy::SecretString;

use crate::transfer::entry::PasswordEntry;

/// Serializes the decrypted store content.
pub trait EntryCodec: Send + Sync {
    fn encode(&self, entries: &[PasswordEntry]) -> Result<Vec<u8>>;
    fn decode(&self, data: &[u8]) -> Result<Vec<PasswordEntry>>;
}

pub trait ByteStore: Send + Sync {
    /// Empty when nothing has been written yet.
    fn read(&self) -> Result<Vec<u8>>;
    fn write(&self, bytes: &[u8]) -> Result<()>;
}

/// Supplies the master password of the store.
pub trait PasswordSource: Send + Sync {
    fn master_password(&self) -> Result<SecretString>;
}
