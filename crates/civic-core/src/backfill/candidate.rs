use serde::Serialize;
use std::fmt;

use crate::{has_gender_suffix, GenderToken, UserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingGender,
    UnrecognizedGender(char),
    EmptyCustomId,
    AlreadySuffixed,
    /// The record no longer held the identifier it was read with.
    ChangedConcurrently,
}

impl SkipReason {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingGender => "missing_gender",
            Self::UnrecognizedGender(_) => "unrecognized_gender",
            Self::EmptyCustomId => "empty_custom_id",
            Self::AlreadySuffixed => "already_suffixed",
            Self::ChangedConcurrently => "changed_concurrently",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedGender(token) => write!(f, "{} ({token})", self.code()),
            _ => f.write_str(self.code()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible { base: String, token: GenderToken },
    Skipped(SkipReason),
}

/// Applies the selection predicate to one record.
#[must_use]
pub fn classify(record: &UserRecord) -> Eligibility {
    let Some(token) = GenderToken::derive(record.gender.as_deref()) else {
        return Eligibility::Skipped(SkipReason::MissingGender);
    };
    if !token.is_recognized() {
        return Eligibility::Skipped(SkipReason::UnrecognizedGender(token.as_char()));
    }
    let base = record.custom_id.trim();
    if base.is_empty() {
        return Eligibility::Skipped(SkipReason::EmptyCustomId);
    }
    if has_gender_suffix(base) {
        return Eligibility::Skipped(SkipReason::AlreadySuffixed);
    }
    Eligibility::Eligible {
        base: base.to_string(),
        token,
    }
}

/// `base + token` for suffix 0, `base + token + suffix` otherwise.
#[must_use]
pub fn candidate_id(base: &str, token: GenderToken, suffix: u64) -> String {
    if suffix == 0 {
        format!("{base}{token}")
    } else {
        format!("{base}{token}{suffix}")
    }
}
