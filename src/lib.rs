//! rowdb is a small single-node row store: rows live in fixed-size page
//! files on disk, a per-file btree index maps row keys to byte offsets, and
//! queries arrive as JSON-encoded trees of relational operators answered by
//! a pull-based iterator pipeline.
//!
//! System layers, leaves first:
//!
// "varint" - base-128 integer encoding used throughout the file formats.
pub mod varint;
// "row" - the key + named-string-columns value the engine stores and yields.
pub mod row;
// "page" - the bit-exact 1 KiB page layout: free-space header, packed
// length-prefixed records, zero tail.
pub mod page;
// "btree" - the in-memory order-m index tree, serialised into index files.
pub mod btree;
// "storage" - reads and writes one data page and its sibling index file.
pub mod storage;
// "predicate" - the comparison trees SELECTION evaluates per row.
pub mod predicate;
// "ops" - the pull-based operators: file scan, scan, limit, projection,
// selection, sort, count.
pub mod ops;
// "plan" - turns a JSON query document into an operator pipeline via a
// registry of constructors.
pub mod plan;
// "formatting" - renders query output for the CLI.
pub mod formatting;

pub use ops::RowIter;
pub use plan::Planner;
pub use row::Row;
pub use storage::{StorageReader, StorageWriter};

/// Plans `query` with the built-in operator set and drains the pipeline.
/// A malformed plan yields no rows rather than an error.
pub fn run_query(query: &str) -> Result<Vec<Row>, ops::Error> {
    let planner = Planner::new();
    let mut it = planner.plan_or_empty(query);
    let mut rows = Vec::new();
    while let Some(row) = it.next()? {
        rows.push(row);
    }
    Ok(rows)
}
