//! storage reads and writes one fixed-size data page and its sibling index
//! file.  For page `n` under a directory there are two files, `data_<n>` and
//! `index_<n>`, both laid out per [`crate::page`].  The writer owns both
//! files for a write session and mirrors every accepted row into an
//! in-memory btree, rewriting the whole index file after each insert; the
//! reader loads the page into memory once and serves row lookups from it.

use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::btree;
use crate::page;
use crate::row::Row;

/// Order of the in-memory index tree.  An index over a 1 KiB page holds few
/// entries; order 3 still grows multi-level trees at that size.
const INDEX_TREE_ORDER: usize = 3;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error reading or writing a storage file: {0}.")]
    Io(#[from] std::io::Error),
    #[error("No row stored under key {0:?}.")]
    NotFound(String),
    #[error("The index file is corrupt: {0}.")]
    CorruptIndex(String),
    #[error(transparent)]
    Page(#[from] page::Error),
}

fn data_path(dir: &Path, file_number: u32) -> PathBuf {
    dir.join(format!("data_{}", file_number))
}

fn index_path(dir: &Path, file_number: u32) -> PathBuf {
    dir.join(format!("index_{}", file_number))
}

/// Locators are `<data-file-path>-<decimal-offset>`, the offset absolute
/// within the file.  Keys and paths containing `,` or `-` are not supported
/// by the index format.
fn parse_locator(locator: &str) -> Result<u32, Error> {
    let (_path, offset) = locator
        .rsplit_once('-')
        .ok_or_else(|| Error::CorruptIndex(format!("bad locator {:?}", locator)))?;
    offset
        .parse::<u32>()
        .map_err(|_| Error::CorruptIndex(format!("bad offset in locator {:?}", locator)))
}

pub struct StorageWriter {
    data: File,
    index: File,
    data_path: String,
    index_tree: Option<btree::Tree>,
}

impl StorageWriter {
    /// Creates `data_<n>` and `index_<n>` under `dir`, each truncated to one
    /// empty page with a full free-space header.
    pub fn create(dir: &Path, file_number: u32, use_index: bool) -> Result<StorageWriter, Error> {
        let dpath = data_path(dir, file_number);
        let data = Self::create_page_file(&dpath)?;
        let index = Self::create_page_file(&index_path(dir, file_number))?;
        Ok(StorageWriter {
            data,
            index,
            data_path: dpath.display().to_string(),
            index_tree: if use_index {
                Some(btree::Tree::new(INDEX_TREE_ORDER))
            } else {
                None
            },
        })
    }

    fn create_page_file(path: &Path) -> Result<File, Error> {
        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        f.set_len(page::PAGE_SIZE as u64)?;
        f.seek(SeekFrom::Start(0))?;
        f.write_u32::<BigEndian>(page::RECORD_CAPACITY as u32)?;
        Ok(f)
    }

    /// Appends one row to the page.  `Ok(false)` means the row does not fit
    /// in the remaining free space; nothing was written.
    pub fn write(&mut self, row: &Row) -> Result<bool, Error> {
        self.data.seek(SeekFrom::Start(0))?;
        let free_space = self.data.read_u32::<BigEndian>()?;
        let bytes = page::encode_row(row);
        if bytes.len() as u32 > free_space {
            debug!(
                key = %row.key,
                need = bytes.len(),
                free = free_space,
                "row does not fit in page"
            );
            return Ok(false);
        }
        let offset = page::PAGE_SIZE as u32 - free_space;
        self.data.seek(SeekFrom::Start(offset as u64))?;
        self.data.write_all(&bytes)?;
        self.data.seek(SeekFrom::Start(0))?;
        self.data
            .write_u32::<BigEndian>(free_space - bytes.len() as u32)?;
        if let Some(tree) = self.index_tree.as_mut() {
            tree.insert(&row.key, &format!("{}-{}", self.data_path, offset));
            Self::rewrite_index(&mut self.index, tree)?;
        }
        Ok(true)
    }

    /// Dumps the whole tree back into the index file: records from offset 4
    /// in key order, zeroed tail, header updated.  The index file may grow
    /// past one page when the entries outweigh the rows; its header then
    /// reads zero free space.
    fn rewrite_index(index: &mut File, tree: &btree::Tree) -> Result<(), Error> {
        let entries = tree.entries();
        let mut records = Vec::new();
        for (key, locator) in &entries {
            records.extend_from_slice(&page::encode_entry(
                format!("{},{}", key, locator).as_bytes(),
            ));
        }
        let free_space = (page::RECORD_CAPACITY as u32).saturating_sub(records.len() as u32);
        index.seek(SeekFrom::Start(0))?;
        index.write_u32::<BigEndian>(free_space)?;
        index.write_all(&records)?;
        // Records from an earlier, larger tree state must not survive.
        let used = page::HEADER_SIZE + records.len();
        if used < page::PAGE_SIZE {
            index.write_all(&vec![0u8; page::PAGE_SIZE - used])?;
        }
        index.set_len(used.max(page::PAGE_SIZE) as u64)?;
        debug!(entries = entries.len(), bytes = records.len(), "rewrote index");
        Ok(())
    }

    /// Syncs both files to disk and ends the write session.
    pub fn flush(self) -> Result<(), Error> {
        self.data.sync_all()?;
        self.index.sync_all()?;
        Ok(())
    }
}

pub struct StorageReader {
    page: Vec<u8>,
    free_space: u32,
    index_tree: Option<btree::Tree>,
}

impl StorageReader {
    /// Opens page `file_number` under `dir`.  With `use_index` the btree is
    /// rebuilt from the index file's record stream; a stream that ends
    /// mid-record there is fatal, not end-of-page.
    pub fn open(dir: &Path, file_number: u32, use_index: bool) -> Result<StorageReader, Error> {
        let mut data = File::open(data_path(dir, file_number))?;
        let mut bytes = vec![0u8; page::PAGE_SIZE];
        data.read_exact(&mut bytes)?;
        let free_space = Cursor::new(&bytes).read_u32::<BigEndian>()?;
        let index_tree = if use_index {
            Some(Self::load_index(&index_path(dir, file_number))?)
        } else {
            None
        };
        Ok(StorageReader {
            page: bytes,
            free_space,
            index_tree,
        })
    }

    fn load_index(path: &Path) -> Result<btree::Tree, Error> {
        let mut f = File::open(path)?;
        let mut bytes = Vec::new();
        f.read_to_end(&mut bytes)?;
        if bytes.len() < page::HEADER_SIZE {
            return Err(Error::CorruptIndex(String::from("missing header")));
        }
        let free_space = Cursor::new(&bytes).read_u32::<BigEndian>()?;
        // A zero header means the index outgrew the page; trust the file
        // length instead.
        let used = if free_space == 0 {
            bytes.len() - page::HEADER_SIZE
        } else {
            page::RECORD_CAPACITY.saturating_sub(free_space as usize)
        };
        let mut tree = btree::Tree::new(INDEX_TREE_ORDER);
        let mut offset = page::HEADER_SIZE;
        let end = page::HEADER_SIZE + used;
        while offset < end {
            let (body, consumed) = page::decode_entry(&bytes[offset..end])
                .map_err(|_| Error::CorruptIndex(format!("truncated record at byte {}", offset)))?;
            let body = String::from_utf8_lossy(body);
            let (key, locator) = body.split_once(',').ok_or_else(|| {
                Error::CorruptIndex(format!("no separator in entry {:?}", body))
            })?;
            tree.insert(key, locator);
            offset += consumed;
        }
        Ok(tree)
    }

    /// Reads the row whose length varint begins at `offset`, measured from
    /// the start of the record region.  Returns the row and the offset just
    /// past it, or `None` once the occupied region is exhausted.
    pub fn read_row(&self, offset: u32) -> Result<Option<(Row, u32)>, Error> {
        let used = page::RECORD_CAPACITY.saturating_sub(self.free_space as usize);
        let offset = offset as usize;
        if offset >= used {
            return Ok(None);
        }
        let start = page::HEADER_SIZE + offset;
        let end = page::HEADER_SIZE + used;
        let (row, consumed) = page::decode_row(&self.page[start..end])?;
        Ok(Some((row, (offset + consumed) as u32)))
    }

    /// Looks one row up by key: through the index when one is loaded,
    /// otherwise by scanning the page from the front.
    pub fn read(&self, key: &str) -> Result<Row, Error> {
        match &self.index_tree {
            Some(tree) => {
                let locator = tree
                    .find(key)
                    .ok_or_else(|| Error::NotFound(key.to_string()))?;
                let offset = parse_locator(locator)?;
                let region_offset = offset
                    .checked_sub(page::HEADER_SIZE as u32)
                    .ok_or_else(|| {
                        Error::CorruptIndex(format!("locator {:?} points into the header", locator))
                    })?;
                let (row, _) = self.read_row(region_offset)?.ok_or_else(|| {
                    Error::CorruptIndex(format!("locator {:?} points past the page", locator))
                })?;
                Ok(row)
            }
            None => {
                let mut cursor = 0;
                while let Some((row, next)) = self.read_row(cursor)? {
                    if row.key == key {
                        return Ok(row);
                    }
                    cursor = next;
                }
                Err(Error::NotFound(key.to_string()))
            }
        }
    }
}
