use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol uniquely identifying one index/instrument in the input table.
///
/// Index names in the source data contain spaces, ampersands, colons and
/// parentheses (e.g. "Nifty500 Multicap 50:25:25"), so the only rules are
/// that the name is trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a raw column header.
    ///
    /// # Errors
    /// Returns `SymbolError::Empty` if the name is empty after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, SymbolError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SymbolError::Empty);
        }
        if trimmed.len() == name.len() {
            Ok(Symbol(name))
        } else {
            Ok(Symbol(trimmed.to_string()))
        }
    }

    /// Returns the symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when creating a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// The name is empty or whitespace only
    Empty,
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::Empty => write!(f, "Symbol cannot be empty"),
        }
    }
}

impl std::error::Error for SymbolError {}
