//! Search pipeline and disclosure policy.
//!
//! A request moves through validation, blind index computation, storage
//! lookup and decryption, then the caller's asserted role decides whether the
//! decrypted payload is disclosed. Every failure is folded into a
//! [`SearchOutcome`]; nothing escapes the request boundary.
//!
//! The role is taken from the request as-is. No authentication of the
//! asserted role happens here.

use crate::blind_index::BlindIndexer;
use crate::error::{Error, StorageError};
use crate::field::SearchField;
use crate::keys::VaultKeys;
use crate::store::RecordStore;
use crate::vault::{Payload, Vault};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Role used when the request does not assert one.
pub const DEFAULT_ROLE: &str = "user";

/// A search request as received from a caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    /// Logical field name (`customer_name`, `name` or `account_id`).
    #[serde(default)]
    pub field: Option<String>,
    /// Value to look up.
    #[serde(default)]
    pub value: Option<String>,
    /// Asserted role; absent means `user`. Non-string claims are kept in
    /// their JSON text form and so never resolve to admin.
    #[serde(default, deserialize_with = "role_claim")]
    pub role: Option<String>,
}

fn role_claim<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(role)) => Some(role),
        Some(other) => Some(other.to_string()),
    })
}

impl SearchRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field: Some(field.into()), value: Some(value.into()), role: None }
    }

    /// Sets the asserted role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Checks required fields and resolves the field name.
    ///
    /// # Errors
    ///
    /// - `ValidationError::MissingFieldOrValue` if `field` or `value` is
    ///   absent or empty
    /// - `ValidationError::UnsupportedField` if `field` is not searchable
    pub fn validate(self) -> Result<ValidatedQuery, ValidationError> {
        let (Some(field), Some(value)) = (self.field, self.value) else {
            return Err(ValidationError::MissingFieldOrValue);
        };
        if field.is_empty() || value.is_empty() {
            return Err(ValidationError::MissingFieldOrValue);
        }
        let field = SearchField::parse(&field).ok_or(ValidationError::UnsupportedField(field))?;
        Ok(ValidatedQuery { field, value, role: Role::from_claim(self.role.as_deref()) })
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    /// Field to search.
    pub field: SearchField,
    /// Raw value, not yet canonicalized.
    pub value: String,
    /// Resolved role.
    pub role: Role,
}

/// Caller role for disclosure decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sees the decrypted payload.
    Admin,
    /// Only learns that a record exists.
    User,
}

impl Role {
    /// Resolves an asserted role string. Matching is case-insensitive and
    /// ignores surrounding whitespace; anything but `admin` is `User`.
    #[must_use]
    pub fn from_claim(claim: Option<&str>) -> Self {
        let claim = claim.unwrap_or(DEFAULT_ROLE).trim().to_lowercase();
        if claim == "admin" {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// Applies the disclosure policy to a decrypted payload.
    #[must_use]
    pub fn disclose(self, payload: Payload) -> Disclosure {
        match self {
            Self::Admin => Disclosure::Full(payload),
            Self::User => Disclosure::Redacted,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::User => f.write_str("user"),
        }
    }
}

/// What a successful search reveals.
#[derive(Debug, Clone, PartialEq)]
pub enum Disclosure {
    /// The full decrypted payload.
    Full(Payload),
    /// Existence only; the payload is withheld entirely.
    Redacted,
}

/// Request-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Body absent, `null` or an empty object
    #[error("No data provided")]
    EmptyBody,

    /// Body is not JSON, or a field has the wrong type
    #[error("Invalid request body")]
    InvalidBody,

    /// `field` or `value` missing or empty
    #[error("Missing field or value")]
    MissingFieldOrValue,

    /// `field` is not one of the searchable fields
    #[error("Invalid search field")]
    UnsupportedField(String),
}

/// Internal failure kinds. Their messages never reveal which step of
/// decryption failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalError {
    /// Tag mismatch, malformed record or unparseable payload.
    Decryption,
    /// Storage backend unreachable or query failed.
    Storage,
    /// Anything else.
    Unhandled,
}

impl InternalError {
    /// Caller-facing message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Decryption => "Decryption failed",
            Self::Storage => "Database error",
            Self::Unhandled => "Internal server error",
        }
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of one search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// A record matched and was decrypted.
    Found(Disclosure),
    /// No record carries the computed token.
    NotFound,
    /// The request was rejected before touching keys or storage.
    Rejected(ValidationError),
    /// Something failed after validation.
    Failed(InternalError),
}

enum SearchError {
    Validation(ValidationError),
    NotFound,
    Decryption(Error),
    Storage(StorageError),
    Internal(Error),
}

impl From<SearchError> for SearchOutcome {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(reason) => {
                warn!(%reason, "search request rejected");
                Self::Rejected(reason)
            }
            SearchError::NotFound => {
                info!("no record matches the blind index");
                Self::NotFound
            }
            SearchError::Decryption(err) => {
                warn!(target: "security", error = %err, "record failed to decrypt");
                Self::Failed(InternalError::Decryption)
            }
            SearchError::Storage(err) => {
                error!(error = %err, "record lookup failed");
                Self::Failed(InternalError::Storage)
            }
            SearchError::Internal(err) => {
                error!(error = %err, "search failed");
                Self::Failed(InternalError::Unhandled)
            }
        }
    }
}

/// Runs searches against a record store.
///
/// Holds the process-wide keys; it carries no per-request state, so one
/// engine can serve concurrent requests.
pub struct SearchEngine {
    indexer: BlindIndexer,
    vault: Vault,
    store: Box<dyn RecordStore>,
}

impl SearchEngine {
    /// Creates an engine from its parts.
    #[must_use]
    pub fn new(indexer: BlindIndexer, vault: Vault, store: impl RecordStore + 'static) -> Self {
        Self { indexer, vault, store: Box::new(store) }
    }

    /// Creates an engine from loaded keys.
    #[must_use]
    pub fn from_keys(keys: VaultKeys, store: impl RecordStore + 'static) -> Self {
        let (master, index) = keys.into_parts();
        Self::new(BlindIndexer::new(index), Vault::new(master), store)
    }

    /// Runs one search request end to end.
    pub fn search(&self, request: SearchRequest) -> SearchOutcome {
        debug!(
            field = ?request.field,
            value_len = request.value.as_ref().map(String::len),
            role = ?request.role,
            "search request received"
        );
        match self.run(request) {
            Ok(disclosure) => SearchOutcome::Found(disclosure),
            Err(err) => err.into(),
        }
    }

    fn run(&self, request: SearchRequest) -> Result<Disclosure, SearchError> {
        let query = request.validate().map_err(SearchError::Validation)?;

        let token = self.indexer.index(query.field, &query.value).map_err(SearchError::Internal)?;
        debug!(field = %query.field, token = %token.short_hex(), "blind index computed");

        let column = query.field.index_column();
        let record = self
            .store
            .find_by_index(column, &token)
            .map_err(SearchError::Storage)?
            .ok_or(SearchError::NotFound)?;
        debug!(%column, "record found");

        let payload = self.vault.open_payload(&record).map_err(SearchError::Decryption)?;

        let disclosure = query.role.disclose(payload);
        info!(
            role = %query.role,
            redacted = matches!(disclosure, Disclosure::Redacted),
            "search successful"
        );
        Ok(disclosure)
    }
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine").finish_non_exhaustive()
    }
}
