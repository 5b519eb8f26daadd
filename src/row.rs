//! A row is the unit the engine stores and the operators pass around: a key
//! plus an ordered list of named string columns.

use itertools::Itertools;

/// Returned when a row is asked for a column it does not hold.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("No column {0:?} for row.")]
pub struct MissingColumn(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    pub columns: Vec<(String, String)>,
}

impl Row {
    pub fn new(key: impl Into<String>, columns: Vec<(String, String)>) -> Row {
        Row {
            key: key.into(),
            columns,
        }
    }

    /// The value of the named column, if the row holds it.
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`Row::column`], but an absent column is an error the query
    /// layer surfaces.
    pub fn require(&self, name: &str) -> Result<&str, MissingColumn> {
        self.column(name)
            .ok_or_else(|| MissingColumn(name.to_string()))
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.columns
                .iter()
                .map(|(n, v)| format!("{}: {}", n, v))
                .join(", ")
        )
    }
}

#[test]
fn test_column_lookup() {
    let row = Row::new(
        "1",
        vec![
            (String::from("Name"), String::from("Movie 1")),
            (String::from("Id"), String::from("1")),
        ],
    );
    assert_eq!(row.column("Name"), Some("Movie 1"));
    assert_eq!(row.column("Year"), None);
    assert_eq!(row.require("Id"), Ok("1"));
    assert_eq!(
        row.require("Year"),
        Err(MissingColumn(String::from("Year")))
    );
}
