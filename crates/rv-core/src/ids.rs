//! Typed ID wrappers providing compile-time safety for entity identifiers.
//!
//! Albums and media items are keyed by SQLite integer row ids. Each ID type
//! is a newtype over `i64` so an `AlbumId` can never be passed where a
//! `MediaId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generate a newtype ID wrapper over `i64`.
///
/// The macro produces a struct with:
/// - `get()` returning the raw row id
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Serialize`, `Deserialize`
/// - `Display` and `FromStr` delegating to the inner integer
/// - `From<i64>` and `Into<i64>` conversions
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(i64);

            impl $name {
                /// Return the raw row id.
                #[must_use]
                pub fn get(&self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    s.trim().parse::<i64>().map(Self)
                }
            }

            impl From<i64> for $name {
                fn from(id: i64) -> Self {
                    Self(id)
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
    /// Identifier of an album (the folder media is uploaded into).
    AlbumId,
    /// Identifier of a stored media item (video or photo).
    MediaId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_from_str() {
        let id = MediaId::from(42);
        let parsed: MediaId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("abc".parse::<AlbumId>().is_err());
        assert!("".parse::<AlbumId>().is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let id = AlbumId::from(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: AlbumId = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn roundtrip_i64() {
        let raw: i64 = MediaId::from(123).into();
        assert_eq!(raw, 123);
    }
}
