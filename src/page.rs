//! On-disk page layout.  A data file is exactly [`PAGE_SIZE`] bytes: a
//! big-endian u32 at offset 0 counting the still-writable bytes, then
//! length-prefixed records packed upward from offset [`HEADER_SIZE`], then a
//! zero tail.  Index files share the outer shape; their records are single
//! length-prefixed blobs.

use crate::row::Row;
use crate::varint;

pub const PAGE_SIZE: usize = 1024;
pub const HEADER_SIZE: usize = 4;
/// Bytes available to records in a fresh page.
pub const RECORD_CAPACITY: usize = PAGE_SIZE - HEADER_SIZE;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("The record bytes ended before the declared length.")]
    Truncated,
}

impl From<varint::Error> for Error {
    fn from(_: varint::Error) -> Error {
        Error::Truncated
    }
}

/// Serialises one row:
///
/// ```text
/// varint  payload_len   (everything after this varint)
/// varint  key_len
/// bytes   key
/// repeated until payload_len is consumed:
///   varint col_name_len, bytes col_name, varint col_val_len, bytes col_val
/// ```
pub fn encode_row(row: &Row) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&varint::encode(row.key.len() as u64));
    payload.extend_from_slice(row.key.as_bytes());
    for (name, value) in &row.columns {
        payload.extend_from_slice(&varint::encode(name.len() as u64));
        payload.extend_from_slice(name.as_bytes());
        payload.extend_from_slice(&varint::encode(value.len() as u64));
        payload.extend_from_slice(value.as_bytes());
    }
    let mut out = varint::encode(payload.len() as u64);
    out.extend_from_slice(&payload);
    out
}

/// Parses one row from the front of `buf`, returning it and the total bytes
/// consumed, its length varint included.
pub fn decode_row(buf: &[u8]) -> Result<(Row, usize), Error> {
    let (payload_len, len_len) = varint::decode(buf)?;
    let payload = len_len
        .checked_add(payload_len as usize)
        .and_then(|end| buf.get(len_len..end))
        .ok_or(Error::Truncated)?;
    let (key, mut offset) = take_string(payload, 0)?;
    let mut columns = Vec::new();
    while offset < payload.len() {
        let (name, next) = take_string(payload, offset)?;
        // A column name with no value is a torn record.
        let (value, after) = take_string(payload, next)?;
        columns.push((name, value));
        offset = after;
    }
    Ok((Row { key, columns }, len_len + payload.len()))
}

fn take_string(buf: &[u8], offset: usize) -> Result<(String, usize), Error> {
    let (len, len_len) = varint::decode(&buf[offset..])?;
    let start = offset + len_len;
    let end = start
        .checked_add(len as usize)
        .filter(|end| *end <= buf.len())
        .ok_or(Error::Truncated)?;
    Ok((String::from_utf8_lossy(&buf[start..end]).into_owned(), end))
}

/// Wraps an index-record body in its length prefix.
pub fn encode_entry(body: &[u8]) -> Vec<u8> {
    let mut out = varint::encode(body.len() as u64);
    out.extend_from_slice(body);
    out
}

/// Parses one length-prefixed index record from the front of `buf`.
pub fn decode_entry(buf: &[u8]) -> Result<(&[u8], usize), Error> {
    let (len, len_len) = varint::decode(buf)?;
    let end = len_len
        .checked_add(len as usize)
        .filter(|end| *end <= buf.len())
        .ok_or(Error::Truncated)?;
    Ok((&buf[len_len..end], end))
}

#[cfg(test)]
fn two_column_row() -> Row {
    Row::new(
        "aa",
        vec![
            (String::from("x"), String::from("yy")),
            (String::from("z"), String::from("ww")),
        ],
    )
}

#[test]
fn test_encode_row_exact_bytes() {
    use hex::FromHex;
    // payload_len 13, key_len 2, "aa", then x=yy and z=ww.
    let expected = Vec::from_hex("0d0261610178027979017a027777").unwrap();
    assert_eq!(encode_row(&two_column_row()), expected);
}

#[test]
fn test_decode_row_round_trip() {
    let bytes = encode_row(&two_column_row());
    let (row, consumed) = decode_row(&bytes).unwrap();
    assert_eq!(row, two_column_row());
    assert_eq!(consumed, bytes.len());
}

#[test]
fn test_decode_row_with_trailing_zeros() {
    // Scans hand decode the rest of the page, zero padding included.
    let mut bytes = encode_row(&two_column_row());
    let record_len = bytes.len();
    bytes.resize(64, 0x00);
    let (row, consumed) = decode_row(&bytes).unwrap();
    assert_eq!(row, two_column_row());
    assert_eq!(consumed, record_len);
}

#[test]
fn test_decode_row_truncated() {
    let bytes = encode_row(&two_column_row());
    for cut in 1..bytes.len() {
        assert_eq!(decode_row(&bytes[..cut]), Err(Error::Truncated));
    }
}

#[test]
fn test_entry_round_trip() {
    let bytes = encode_entry(b"aa,blocks/data_0-4");
    let (body, consumed) = decode_entry(&bytes).unwrap();
    assert_eq!(body, b"aa,blocks/data_0-4");
    assert_eq!(consumed, bytes.len());
}
