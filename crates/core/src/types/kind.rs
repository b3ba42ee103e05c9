//! Product type tags.
//!
//! Products are polymorphic: a base identity shared by every product plus a
//! variant-specific attribute set. `ProductKind` is the tag half of that
//! tagged union. It doubles as the URL segment that identifies a product
//! variant externally, so parsing must reject anything it does not know.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type tag for a product variant.
///
/// Stored as text in the database and used as the `{kind}` URL segment in
/// catalog and cart routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// A notebook computer.
    Notebook,
}

impl ProductKind {
    /// The stable string tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notebook => "notebook",
        }
    }

    /// All known product kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Notebook]
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a product type tag is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product kind: {0}")]
pub struct UnknownKindError(pub String);

impl FromStr for ProductKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notebook" => Ok(Self::Notebook),
            other => Err(UnknownKindError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kind() {
        assert_eq!("notebook".parse::<ProductKind>(), Ok(ProductKind::Notebook));
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "toaster".parse::<ProductKind>().unwrap_err();
        assert_eq!(err, UnknownKindError("toaster".to_owned()));
        assert_eq!(err.to_string(), "unknown product kind: toaster");
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        for kind in ProductKind::all() {
            assert_eq!(kind.as_str().parse::<ProductKind>().as_ref(), Ok(kind));
        }
    }
}
