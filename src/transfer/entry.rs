use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single credential as held by the application and exchanged with every
/// import/export format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordEntry {
    #[serde(default = "new_entry_id")]
    pub id: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(with = "crate::core::secret_string", default = "empty_secret")]
    pub password: SecretString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

fn empty_secret() -> SecretString {
    SecretString::new("".into())
}

impl PasswordEntry {
    pub fn new(site_name: impl Into<String>, username: impl Into<String>, password: &str) -> Self {
        Self {
            id: new_entry_id(),
            site_name: site_name.into(),
            site_url: None,
            username: username.into(),
            password: SecretString::new(password.into()),
            notes: None,
            category: None,
            tags: Vec::new(),
            is_favorite: false,
            created_at: None,
            updated_at: None,
            last_used: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = non_empty(url.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_empty(notes.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_empty(category.into());
        self
    }

    pub fn password_str(&self) -> &str {
        self.password.expose_secret()
    }

    /// Entries without a site name or a password are never handed to callers.
    pub fn is_importable(&self) -> bool {
        !self.site_name.trim().is_empty() && !self.password_str().is_empty()
    }

    pub fn url_str(&self) -> &str {
        self.site_url.as_deref().unwrap_or("")
    }

    pub fn notes_str(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    pub fn category_str(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }
}

impl PartialEq for PasswordEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.site_name == other.site_name
            && self.site_url == other.site_url
            && self.username == other.username
            && self.password_str() == other.password_str()
            && self.notes == other.notes
            && self.category == other.category
            && self.tags == other.tags
            && self.is_favorite == other.is_favorite
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && self.last_used == other.last_used
    }
}

/// Maps empty or whitespace-only strings to `None`.
pub fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
