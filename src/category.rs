//! The fixed set of categories a transaction or budget can belong to.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::{Error, error::FieldError};

/// A transaction classification.
///
/// The declaration order is the enumeration order used whenever a view lists
/// every category or needs a deterministic tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Groceries, eating out, etc.
    Food,
    /// Rent or mortgage payments.
    Rent,
    /// Public transport, fuel, parking, etc.
    Transport,
    /// Power, water, internet, etc.
    Utilities,
    /// Movies, games, concerts, etc.
    Entertainment,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category in enumeration order.
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Rent,
        Category::Transport,
        Category::Utilities,
        Category::Entertainment,
        Category::Other,
    ];

    /// The display name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Rent => "Rent",
            Category::Transport => "Transport",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Other => "Other",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Parse a category from its display name, ignoring case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] on the `category` field if `s` does not
    /// name a category.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();

        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                let message = if name.is_empty() {
                    "Please select a category".to_owned()
                } else {
                    format!("\"{name}\" is not a valid category")
                };

                Error::Validation(FieldError::new("category", message).into())
            })
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::Error;

    use super::Category;

    #[test]
    fn parses_display_names() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Ok(category));
        }
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(Category::from_str("  fOoD \n"), Ok(Category::Food));
    }

    #[test]
    fn parse_rejects_unknown_names() {
        let result = Category::from_str("Groceries");

        match result {
            Err(Error::Validation(errors)) => assert!(errors.has_field("category")),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_empty_string() {
        assert!(matches!(
            Category::from_str(""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn enumeration_order_matches_ord() {
        let mut sorted = Category::ALL;
        sorted.sort();

        assert_eq!(sorted, Category::ALL);
    }
}
