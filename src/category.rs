//! Connection category registry.
//!
//! Each broadband reading belongs to one of five connection categories.
//! The category carries its reading-table name and the friendly connection
//! name used on the query side.

use crate::constants::CATEGORY_COUNT;
use crate::{Error, Result};

/// A broadband connection category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Overall average across all lines
    Average,
    /// Lines slower than 10Mbit/s
    Slow,
    /// Basic broadband lines
    Bb,
    /// Superfast broadband lines
    Sfbb,
    /// Ultrafast broadband lines
    Ufbb,
}

impl Category {
    /// Every category, in registry order (index 0 through 4)
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::Average,
        Category::Slow,
        Category::Bb,
        Category::Sfbb,
        Category::Ufbb,
    ];

    /// Category index, 0 through 4
    pub fn index(self) -> usize {
        match self {
            Category::Average => 0,
            Category::Slow => 1,
            Category::Bb => 2,
            Category::Sfbb => 3,
            Category::Ufbb => 4,
        }
    }

    /// Look up a category by its index digit, as used in header overrides
    pub fn from_index(index: &str) -> Option<Self> {
        match index {
            "0" => Some(Category::Average),
            "1" => Some(Category::Slow),
            "2" => Some(Category::Bb),
            "3" => Some(Category::Sfbb),
            "4" => Some(Category::Ufbb),
            _ => None,
        }
    }

    /// Name of the reading table backing this category
    pub fn table(self) -> &'static str {
        match self {
            Category::Average => "average_readings",
            Category::Slow => "slow_readings",
            Category::Bb => "BB_readings",
            Category::Sfbb => "SFBB_readings",
            Category::Ufbb => "UFBB_readings",
        }
    }

    /// Friendly connection name reported with query results
    pub fn connection_name(self) -> &'static str {
        match self {
            Category::Average => "average",
            Category::Slow => "slow",
            Category::Bb => "BB",
            Category::Sfbb => "SFBB",
            Category::Ufbb => "UFBB",
        }
    }

    /// Reverse lookup from friendly connection name, case-insensitive
    pub fn from_connection(name: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.connection_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid_connection(name))
    }

    /// Expand a connection name into the categories it selects.
    ///
    /// The pseudo-category `"all"` selects every category in registry
    /// order; anything else must be a single friendly name.
    pub fn expand_connection(name: &str) -> Result<Vec<Self>> {
        if name.eq_ignore_ascii_case("all") {
            Ok(Category::ALL.to_vec())
        } else {
            Ok(vec![Category::from_connection(name)?])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_matches_indexes() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_from_index() {
        assert_eq!(Category::from_index("0"), Some(Category::Average));
        assert_eq!(Category::from_index("4"), Some(Category::Ufbb));
        assert_eq!(Category::from_index("5"), None);
        assert_eq!(Category::from_index(""), None);
        assert_eq!(Category::from_index("00"), None);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Category::Average.table(), "average_readings");
        assert_eq!(Category::Slow.table(), "slow_readings");
        assert_eq!(Category::Bb.table(), "BB_readings");
        assert_eq!(Category::Sfbb.table(), "SFBB_readings");
        assert_eq!(Category::Ufbb.table(), "UFBB_readings");
    }

    #[test]
    fn test_from_connection_round_trips() {
        for category in Category::ALL {
            let found = Category::from_connection(category.connection_name()).unwrap();
            assert_eq!(found, category);
        }

        // Case-insensitive
        assert_eq!(Category::from_connection("sfbb").unwrap(), Category::Sfbb);
    }

    #[test]
    fn test_from_connection_rejects_unknown_name() {
        let result = Category::from_connection("dialup");
        assert!(matches!(result, Err(Error::InvalidConnection { .. })));
    }

    #[test]
    fn test_expand_connection() {
        assert_eq!(
            Category::expand_connection("all").unwrap(),
            Category::ALL.to_vec()
        );
        assert_eq!(
            Category::expand_connection("average").unwrap(),
            vec![Category::Average]
        );
        assert!(Category::expand_connection("fibre-to-the-moon").is_err());
    }
}
