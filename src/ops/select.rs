use super::{BoxedRowIter, Error, RowIter};
use crate::predicate::Predicate;
use crate::row::Row;

/// Yields only the child rows the predicate accepts.
pub struct Selection {
    predicate: Predicate,
    child: BoxedRowIter,
}

impl Selection {
    pub fn new(predicate: Predicate, child: BoxedRowIter) -> Selection {
        Selection { predicate, child }
    }
}

impl RowIter for Selection {
    fn next(&mut self) -> Result<Option<Row>, Error> {
        while let Some(row) = self.child.next()? {
            if self.predicate.matches(&row)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}
