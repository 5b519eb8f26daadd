use std::cmp::Ordering;

use super::{BoxedRowIter, Error, RowIter};
use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Order names as they appear in `col:ASC` / `col:DESC` sort keys.
    pub fn parse(name: &str) -> Option<SortOrder> {
        match name {
            "ASC" => Some(SortOrder::Asc),
            "DESC" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Buffers its whole input on the first pull, orders it by the `(column,
/// order)` pairs compared left to right, then streams the result.  The sort
/// is stable, so rows equal under every key keep their input order.
pub struct Sort {
    keys: Vec<(String, SortOrder)>,
    child: BoxedRowIter,
    sorted: Option<std::vec::IntoIter<Row>>,
}

impl Sort {
    pub fn new(keys: Vec<(String, SortOrder)>, child: BoxedRowIter) -> Sort {
        Sort {
            keys,
            child,
            sorted: None,
        }
    }

    fn drain_and_sort(&mut self) -> Result<std::vec::IntoIter<Row>, Error> {
        let mut keyed: Vec<(Vec<String>, Row)> = Vec::new();
        while let Some(row) = self.child.next()? {
            let mut sort_key = Vec::with_capacity(self.keys.len());
            for (column, _) in &self.keys {
                sort_key.push(row.require(column)?.to_string());
            }
            keyed.push((sort_key, row));
        }
        let orders: Vec<SortOrder> = self.keys.iter().map(|(_, o)| *o).collect();
        keyed.sort_by(|(a, _), (b, _)| compare(a, b, &orders));
        let rows: Vec<Row> = keyed.into_iter().map(|(_, row)| row).collect();
        Ok(rows.into_iter())
    }
}

fn compare(a: &[String], b: &[String], orders: &[SortOrder]) -> Ordering {
    for (i, order) in orders.iter().enumerate() {
        let by = match order {
            SortOrder::Asc => a[i].cmp(&b[i]),
            SortOrder::Desc => b[i].cmp(&a[i]),
        };
        if by != Ordering::Equal {
            return by;
        }
    }
    Ordering::Equal
}

impl RowIter for Sort {
    fn next(&mut self) -> Result<Option<Row>, Error> {
        if self.sorted.is_none() {
            self.sorted = Some(self.drain_and_sort()?);
        }
        match self.sorted.as_mut() {
            Some(rows) => Ok(rows.next()),
            None => Ok(None),
        }
    }
}
