use std::collections::HashMap;

use itertools::Itertools;

use super::{BoxedRowIter, Error, RowIter};
use crate::row::Row;

/// Groups its input by the named columns and yields one row per distinct
/// group: the group-by columns plus a synthetic `Count` column holding the
/// decimal group size.  Group order is unspecified; put a Sort above this
/// when the caller needs determinism.
pub struct Count {
    columns: Vec<String>,
    child: BoxedRowIter,
    groups: Option<std::vec::IntoIter<Row>>,
}

impl Count {
    pub fn new(columns: Vec<String>, child: BoxedRowIter) -> Count {
        Count {
            columns,
            child,
            groups: None,
        }
    }

    fn drain_and_group(&mut self) -> Result<std::vec::IntoIter<Row>, Error> {
        let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
        while let Some(row) = self.child.next()? {
            let mut group = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                group.push(row.require(column)?.to_string());
            }
            *counts.entry(group).or_insert(0) += 1;
        }
        let mut out = Vec::with_capacity(counts.len());
        for (group, n) in counts {
            let key = group.iter().join(",");
            let mut columns: Vec<(String, String)> =
                self.columns.iter().cloned().zip(group).collect();
            columns.push((String::from("Count"), n.to_string()));
            out.push(Row { key, columns });
        }
        Ok(out.into_iter())
    }
}

impl RowIter for Count {
    fn next(&mut self) -> Result<Option<Row>, Error> {
        if self.groups.is_none() {
            self.groups = Some(self.drain_and_group()?);
        }
        match self.groups.as_mut() {
            Some(rows) => Ok(rows.next()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{drain, movie, StaticRows};
    use super::*;

    #[test]
    fn test_count_single_group() {
        let rows = vec![
            movie("1", "Movie 1", "1", "1"),
            movie("2", "Movie 1", "2", "2"),
            movie("3", "Movie 1", "3", "3"),
        ];
        let mut count = Count::new(vec![String::from("Name")], Box::new(StaticRows::new(rows)));
        let out = drain(&mut count).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].columns,
            vec![
                (String::from("Name"), String::from("Movie 1")),
                (String::from("Count"), String::from("3")),
            ]
        );
    }

    #[test]
    fn test_count_composite_groups() {
        let rows = vec![
            movie("1", "Movie 1", "1", "1"),
            movie("2", "Movie 1", "1", "2"),
            movie("3", "Movie 1", "3", "3"),
        ];
        let mut count = Count::new(
            vec![String::from("Name"), String::from("Id")],
            Box::new(StaticRows::new(rows)),
        );
        let mut out = drain(&mut count).unwrap();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].columns,
            vec![
                (String::from("Name"), String::from("Movie 1")),
                (String::from("Id"), String::from("1")),
                (String::from("Count"), String::from("2")),
            ]
        );
        assert_eq!(
            out[1].columns,
            vec![
                (String::from("Name"), String::from("Movie 1")),
                (String::from("Id"), String::from("3")),
                (String::from("Count"), String::from("1")),
            ]
        );
    }

    #[test]
    fn test_count_totals_match_the_input() {
        let rows = vec![
            movie("1", "A", "1", "1"),
            movie("2", "A", "1", "2"),
            movie("3", "B", "2", "3"),
            movie("4", "B", "1", "4"),
            movie("5", "A", "2", "5"),
        ];
        let n = rows.len();
        let mut count = Count::new(
            vec![String::from("Name"), String::from("Id")],
            Box::new(StaticRows::new(rows)),
        );
        let total: usize = drain(&mut count)
            .unwrap()
            .iter()
            .map(|r| r.column("Count").unwrap().parse::<usize>().unwrap())
            .sum();
        assert_eq!(total, n);
    }

    #[test]
    fn test_count_missing_column_aborts() {
        let rows = vec![movie("1", "Movie 1", "1", "1")];
        let mut count = Count::new(vec![String::from("Genre")], Box::new(StaticRows::new(rows)));
        assert!(matches!(count.next(), Err(Error::MissingColumn(_))));
    }
}
