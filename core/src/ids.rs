//! Identifier newtypes for events and entrants.
//!
//! The engine never mints these ids itself: both come from the surrounding
//! system (the document store assigns event ids, the auth layer assigns
//! entrant ids). They are therefore thin wrappers around `String` that exist
//! for type safety and clear intent in signatures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for id parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid id: {0}")]
pub struct ParseIdError(String);

/// Unique identifier for an event.
///
/// # Validation
///
/// - `FromStr::from_str()`: Validates input (rejects empty strings)
/// - `From::from()` and `new()`: No validation (for internal use with trusted input)
///
/// Use `FromStr` when parsing external/user input. Use `new()` or `From` when
/// constructing ids from application-controlled data.
///
/// # Examples
///
/// ```
/// use fairdraw_core::ids::EventId;
///
/// let event = EventId::new("event-42");
/// assert_eq!(event.as_str(), "event-42");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

/// Unique identifier for an entrant (a user who can join waiting lists).
///
/// Same validation split as [`EventId`]: `FromStr` validates, `new()` trusts
/// its input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntrantId(String);

macro_rules! string_id {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Create a new id from a string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert the id into its inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() {
                    return Err(ParseIdError(format!("{} cannot be empty", $label)));
                }
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(EventId, "event id");
string_id!(EntrantId, "entrant id");
