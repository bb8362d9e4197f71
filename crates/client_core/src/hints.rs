use std::{fs, path::Path};

use anyhow::{Context, Result};
use rand::{seq::SliceRandom, Rng};
use tracing::{info, warn};

pub const HINT_PLACEHOLDER: &str = "Cargando tips...";

/// Rotating hints shown on the loading overlay. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintDeck {
    hints: Vec<String>,
}

impl Default for HintDeck {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl HintDeck {
    pub fn placeholder() -> Self {
        Self {
            hints: vec![HINT_PLACEHOLDER.to_string()],
        }
    }

    pub fn from_hints(hints: Vec<String>) -> Self {
        if hints.is_empty() {
            return Self::placeholder();
        }
        Self { hints }
    }

    /// Reads a JSON array of strings. Any failure degrades to the placeholder.
    pub fn load(path: &Path) -> Self {
        match read_hints(path) {
            Ok(hints) => {
                info!(path = %path.display(), count = hints.len(), "loaded hints");
                Self::from_hints(hints)
            }
            Err(error) => {
                warn!(path = %path.display(), error = %format!("{error:#}"), "could not load hints");
                Self::placeholder()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.hints
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(HINT_PLACEHOLDER)
    }
}

fn read_hints(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read hints file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("hints file '{}' is not a JSON string array", path.display()))
}

#[cfg(test)]
#[path = "tests/hints_tests.rs"]
mod tests;
