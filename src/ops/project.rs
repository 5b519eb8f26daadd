use super::{BoxedRowIter, Error, RowIter};
use crate::row::Row;

/// Rebuilds each child row with just the named columns, in the order they
/// were requested.  A requested column absent from a row aborts the query.
pub struct Projection {
    columns: Vec<String>,
    child: BoxedRowIter,
}

impl Projection {
    pub fn new(columns: Vec<String>, child: BoxedRowIter) -> Projection {
        Projection { columns, child }
    }
}

impl RowIter for Projection {
    fn next(&mut self) -> Result<Option<Row>, Error> {
        let row = match self.child.next()? {
            Some(row) => row,
            None => return Ok(None),
        };
        let mut columns = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            columns.push((name.clone(), row.require(name)?.to_string()));
        }
        Ok(Some(Row {
            key: row.key,
            columns,
        }))
    }
}
