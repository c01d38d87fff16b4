use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-character code derived from a user's gender value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderToken {
    Male,
    Female,
    Other(char),
}

impl GenderToken {
    /// Reads a raw gender value: trimmed, uppercased, first character.
    /// Returns `None` when the value is absent or blank.
    #[must_use]
    pub fn derive(raw: Option<&str>) -> Option<Self> {
        let normalized = raw?.trim().to_uppercase();
        let first = normalized.chars().next()?;
        Some(match first {
            'M' => Self::Male,
            'F' => Self::Female,
            other => Self::Other(other),
        })
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Male => 'M',
            Self::Female => 'F',
            Self::Other(value) => value,
        }
    }

    #[must_use]
    pub const fn is_recognized(self) -> bool {
        matches!(self, Self::Male | Self::Female)
    }
}

impl fmt::Display for GenderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// True when the trimmed identifier's final character is a gender letter, in
/// either case.
#[must_use]
pub fn ends_with_gender_letter(custom_id: &str) -> bool {
    matches!(
        custom_id.trim().chars().next_back(),
        Some('M' | 'm' | 'F' | 'f')
    )
}

/// True when the trimmed identifier already carries a gender suffix: a final
/// gender letter, or a gender letter after a non-empty base followed by a
/// numeric tiebreak (`U100M1`). Tiebreaks never start with `0`.
#[must_use]
pub fn has_gender_suffix(custom_id: &str) -> bool {
    let trimmed = custom_id.trim();
    if ends_with_gender_letter(trimmed) {
        return true;
    }
    let head = trimmed.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &trimmed[head.len()..];
    if digits.is_empty() || digits.starts_with('0') {
        return false;
    }
    let mut chars = head.chars();
    matches!(chars.next_back(), Some('M' | 'm' | 'F' | 'f')) && chars.next_back().is_some()
}
