//! Product category variants.

use serde::{Deserialize, Serialize};

/// The four physical media categories the shop sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Book,
    Cd,
    Dvd,
    Lp,
}

impl ProductKind {
    /// Label for the kind-specific display credit (who made the thing).
    #[must_use]
    pub const fn credit_label(&self) -> &'static str {
        match self {
            Self::Book => "author",
            Self::Cd | Self::Lp => "artist",
            Self::Dvd => "director",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Book => "book",
            Self::Cd => "cd",
            Self::Dvd => "dvd",
            Self::Lp => "lp",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "book" => Ok(Self::Book),
            "cd" => Ok(Self::Cd),
            "dvd" => Ok(Self::Dvd),
            "lp" => Ok(Self::Lp),
            _ => Err(format!("invalid product kind: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&ProductKind::Lp).unwrap(), "\"lp\"");
        let kind: ProductKind = serde_json::from_str("\"dvd\"").unwrap();
        assert_eq!(kind, ProductKind::Dvd);
    }

    #[test]
    fn test_credit_labels() {
        assert_eq!(ProductKind::Book.credit_label(), "author");
        assert_eq!(ProductKind::Cd.credit_label(), "artist");
        assert_eq!(ProductKind::Lp.credit_label(), "artist");
        assert_eq!(ProductKind::Dvd.credit_label(), "director");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("cd".parse::<ProductKind>().unwrap(), ProductKind::Cd);
        assert!("cassette".parse::<ProductKind>().is_err());
    }
}
