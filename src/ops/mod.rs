//! Pull-based relational operators.  Every operator implements [`RowIter`]:
//! `next` yields the next row, or `None` once drained.  An operator owns its
//! child exclusively, so dropping the root tears the whole pipeline down,
//! and cancellation is simply the caller not pulling again.

mod count;
mod limit;
mod project;
mod scan;
mod select;
mod sort;

pub use count::Count;
pub use limit::Limit;
pub use project::Projection;
pub use scan::{FileScan, Scan};
pub use select::Selection;
pub use sort::{Sort, SortOrder};

use crate::row::{MissingColumn, Row};
use crate::storage;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    MissingColumn(#[from] MissingColumn),
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

pub trait RowIter {
    /// Pulls the next row from this operator.
    fn next(&mut self) -> Result<Option<Row>, Error>;
}

pub type BoxedRowIter = Box<dyn RowIter>;

/// What a failed plan builds into: an iterator that is already drained.
pub struct Empty;

impl RowIter for Empty {
    fn next(&mut self) -> Result<Option<Row>, Error> {
        Ok(None)
    }
}
