use super::{BoxedRowIter, Error, RowIter};
use crate::row::Row;

/// Yields at most the first `limit` rows of its child.
pub struct Limit {
    limit: u32,
    taken: u32,
    child: BoxedRowIter,
}

impl Limit {
    pub fn new(limit: u32, child: BoxedRowIter) -> Limit {
        Limit {
            limit,
            taken: 0,
            child,
        }
    }
}

impl RowIter for Limit {
    fn next(&mut self) -> Result<Option<Row>, Error> {
        if self.taken == self.limit {
            return Ok(None);
        }
        self.taken += 1;
        self.child.next()
    }
}
