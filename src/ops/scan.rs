//! Sources: the page scan and the historical pass-through wrapper.

use super::{BoxedRowIter, Error, RowIter};
use crate::page;
use crate::row::Row;
use crate::storage::{self, StorageReader};

/// Scans a data page front to back by following record offsets.
pub struct FileScan {
    reader: StorageReader,
    cursor: u32,
}

impl FileScan {
    pub fn new(reader: StorageReader) -> FileScan {
        FileScan { reader, cursor: 0 }
    }
}

impl RowIter for FileScan {
    fn next(&mut self) -> Result<Option<Row>, Error> {
        match self.reader.read_row(self.cursor) {
            Ok(Some((row, next))) => {
                self.cursor = next;
                Ok(Some(row))
            }
            Ok(None) => Ok(None),
            // A record torn at the end of the page reads as end of input.
            Err(storage::Error::Page(page::Error::Truncated)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Pass-through over its child.  Plans spell a SCAN above their source; it
/// adds nothing beyond keeping that shape buildable.
pub struct Scan {
    child: BoxedRowIter,
}

impl Scan {
    pub fn new(child: BoxedRowIter) -> Scan {
        Scan { child }
    }
}

impl RowIter for Scan {
    fn next(&mut self) -> Result<Option<Row>, Error> {
        self.child.next()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{drain, movies, StaticRows};
    use super::*;
    use crate::storage::StorageWriter;
    use std::path::PathBuf;

    #[test]
    fn test_scan_passes_rows_through() {
        let mut scan = Scan::new(Box::new(StaticRows::new(movies())));
        assert_eq!(drain(&mut scan).unwrap(), movies());
        assert!(scan.next().unwrap().is_none());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rowdb_scan_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).expect("Should have created scratch dir");
        dir
    }

    #[test]
    fn test_file_scan_reads_a_page_in_write_order() {
        let dir = scratch_dir("page");
        let mut writer = StorageWriter::create(&dir, 0, false).unwrap();
        for m in movies() {
            assert!(writer.write(&m).unwrap());
        }
        writer.flush().unwrap();

        let reader = StorageReader::open(&dir, 0, false).unwrap();
        let mut scan = FileScan::new(reader);
        assert_eq!(drain(&mut scan).unwrap(), movies());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_scan_stops_cleanly_on_a_torn_tail() {
        let dir = scratch_dir("torn");
        let mut writer = StorageWriter::create(&dir, 0, false).unwrap();
        assert!(writer.write(&movies()[0]).unwrap());
        writer.flush().unwrap();

        // Shrink the header's free space so the occupied region claims six
        // zero bytes past the real record.
        let path = dir.join("data_0");
        let mut bytes = std::fs::read(&path).unwrap();
        let free_space = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) - 6;
        bytes[..4].copy_from_slice(&free_space.to_be_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let reader = StorageReader::open(&dir, 0, false).unwrap();
        let mut scan = FileScan::new(reader);
        assert_eq!(drain(&mut scan).unwrap(), vec![movies()[0].clone()]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
