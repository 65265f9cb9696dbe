// serde `with` helper for `SecretString` fields of exported entries.
// The value is written as a plain string; `Debug` output stays redacted.
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.expose_secret())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    // Some exporters write `null` for an empty password.
    let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(SecretString::from(s))
}
