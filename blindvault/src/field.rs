//! Searchable fields and their storage index columns.

use crate::normalize::normalize;
use std::borrow::Cow;
use std::fmt;

/// How a field value is canonicalized before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Full text normalization (see [`normalize`]).
    Text,
    /// Hash the raw value; identifiers are already canonical.
    Raw,
}

/// Blind index column in the `secure_vault` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexColumn {
    /// `idx_name`
    Name,
    /// `idx_account_id`
    AccountId,
}

impl IndexColumn {
    /// Column name as used in SQL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "idx_name",
            Self::AccountId => "idx_account_id",
        }
    }
}

impl fmt::Display for IndexColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field callers may search on.
///
/// The set is closed: anything else is rejected during request validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    /// Customer name, accepted as `customer_name` or `name`.
    Name,
    /// Account identifier, accepted as `account_id`.
    AccountId,
}

impl SearchField {
    /// Parses a request field name. Matching is exact.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "customer_name" | "name" => Some(Self::Name),
            "account_id" => Some(Self::AccountId),
            _ => None,
        }
    }

    /// Normalization policy for this field.
    #[must_use]
    pub const fn normalization(self) -> Normalization {
        match self {
            Self::Name => Normalization::Text,
            Self::AccountId => Normalization::Raw,
        }
    }

    /// Storage column holding this field's blind index.
    #[must_use]
    pub const fn index_column(self) -> IndexColumn {
        match self {
            Self::Name => IndexColumn::Name,
            Self::AccountId => IndexColumn::AccountId,
        }
    }

    /// Applies the field's normalization policy to `value`.
    #[must_use]
    pub fn canonicalize(self, value: &str) -> Cow<'_, str> {
        match self.normalization() {
            Normalization::Text => Cow::Owned(normalize(value)),
            Normalization::Raw => Cow::Borrowed(value),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("customer_name"),
            Self::AccountId => f.write_str("account_id"),
        }
    }
}
