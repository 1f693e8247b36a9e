//! Typed ID wrappers for the integer keys handed out by the metadata store.
//!
//! Each ID type is a newtype over a strictly positive `i64`, preventing
//! accidental misuse (e.g., passing an `ImageId` where an `EventId` is
//! expected) and rejecting zero or negative keys at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Generate a newtype ID wrapper over a positive `i64`.
///
/// The macro produces a struct with:
/// - `new(i64)` validating that the value is positive
/// - `get()` returning the raw key
/// - `Display` and `FromStr` delegating to the inner integer
/// - `TryFrom<i64>` / `Into<i64>` conversions used by serde
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident => $entity:literal),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            #[serde(try_from = "i64", into = "i64")]
            pub struct $name(i64);

            impl $name {
                /// Wrap a raw key, rejecting values that are not positive.
                pub fn new(raw: i64) -> crate::Result<Self> {
                    if raw > 0 {
                        Ok(Self(raw))
                    } else {
                        Err(Error::Validation(format!(
                            "{} id must be positive, got {}",
                            $entity, raw
                        )))
                    }
                }

                /// Return the raw key.
                #[must_use]
                pub fn get(self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = Error;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    let raw = s.trim().parse::<i64>().map_err(|_| {
                        Error::Validation(format!("invalid {} id: {:?}", $entity, s))
                    })?;
                    Self::new(raw)
                }
            }

            impl TryFrom<i64> for $name {
                type Error = Error;

                fn try_from(raw: i64) -> std::result::Result<Self, Self::Error> {
                    Self::new(raw)
                }
            }

            impl From<$name> for i64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

typed_id! {
    /// Identifier of an event owned by the metadata store.
    EventId => "event",
    /// Identifier of an image row, assigned by the metadata store on insert.
    ImageId => "image",
}
