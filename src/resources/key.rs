use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{CacheError, Result};

/// A validated resource name that compares and hashes case-insensitively.
///
/// The original spelling is preserved for display and is what loaders receive;
/// only the folded form takes part in equality.
#[derive(Debug, Clone)]
pub struct ResourceKey {
    name: String,
    folded: String,
}

impl ResourceKey {
    /// Validates `name` and builds a key from it.
    ///
    /// Fails with [`CacheError::InvalidArgument`] for an empty string and with
    /// [`CacheError::EmptyValue`] for a string made only of whitespace.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(CacheError::InvalidArgument("name".to_string()));
        }
        if name.trim().is_empty() {
            return Err(CacheError::EmptyValue("name".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            folded: name.to_lowercase(),
        })
    }

    /// The name as originally spelled.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for ResourceKey {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for ResourceKey {}

impl Hash for ResourceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
