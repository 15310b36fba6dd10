//! Personality and output-language selections.
//!
//! Both parse leniently: an unrecognized value falls back to the default
//! instead of failing, so stale or hand-edited settings never break a turn.

use serde::{Deserialize, Serialize};

/// The tone the assistant answers in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Personality {
    Formal,
    #[default]
    Friendly,
    Concise,
}

impl Personality {
    pub const ALL: [Personality; 3] = [Self::Formal, Self::Friendly, Self::Concise];

    /// Parse a setting value; unknown values map to [`Personality::Friendly`].
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "formal" => Self::Formal,
            "concise" => Self::Concise,
            "friendly" => Self::Friendly,
            other => {
                tracing::debug!(value = other, "Unknown personality, using friendly");
                Self::Friendly
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Friendly => "friendly",
            Self::Concise => "concise",
        }
    }
}

impl From<String> for Personality {
    fn from(value: String) -> Self {
        Self::parse_lossy(&value)
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The language every answer must be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum OutputLanguage {
    #[default]
    En,
    Fr,
    It,
    De,
    Es,
}

impl OutputLanguage {
    pub const ALL: [OutputLanguage; 5] = [Self::En, Self::Fr, Self::It, Self::De, Self::Es];

    /// Parse a locale code such as `it` or `it-IT`; unknown codes map to English.
    pub fn parse_lossy(code: &str) -> Self {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Self::En,
            "fr" => Self::Fr,
            "it" => Self::It,
            "de" => Self::De,
            "es" => Self::Es,
            _ => {
                tracing::debug!(code, "Unsupported output language, using English");
                Self::En
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::It => "it",
            Self::De => "de",
            Self::Es => "es",
        }
    }
}

impl From<String> for OutputLanguage {
    fn from(value: String) -> Self {
        Self::parse_lossy(&value)
    }
}

impl std::fmt::Display for OutputLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
