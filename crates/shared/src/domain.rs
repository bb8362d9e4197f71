use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Stable identity of a discovered mod package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModId(pub String);

impl ModId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ModId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One entry of the selection grid, as reported by a `mod-found` event.
///
/// The backend sends empty strings for missing titles or thumbnails; both
/// are normalized to `None` on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModEntry {
    pub id: ModId,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image_path: Option<String>,
}

impl ModEntry {
    pub fn new(id: impl Into<ModId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            image_path: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into()).filter(|title| !title.is_empty());
        self
    }

    pub fn with_image_path(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into()).filter(|path| !path.is_empty());
        self
    }

    /// Title shown on the card; falls back to the id.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.id.as_str())
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.is_empty()))
}
