use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use rowdb::page;
use rowdb::row::Row;
use rowdb::{StorageReader, StorageWriter};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rowdb_it_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).expect("Should have created scratch dir");
    dir
}

fn movie(key: &str, name: &str, id: &str, year: &str) -> Row {
    Row::new(
        key,
        vec![
            (String::from("Name"), name.to_string()),
            (String::from("Id"), id.to_string()),
            (String::from("Year"), year.to_string()),
        ],
    )
}

fn movies() -> Vec<Row> {
    vec![
        movie("1", "Movie 1", "1", "1"),
        movie("2", "Movie 2", "2", "2"),
        movie("3", "Movie 3", "3", "3"),
    ]
}

fn write_movies(dir: &Path) -> Result<()> {
    let mut writer = StorageWriter::create(dir, 0, true)?;
    for m in movies() {
        assert!(writer.write(&m)?, "Page should have accepted {}", m.key);
    }
    writer.flush()?;
    Ok(())
}

#[test]
fn test_write_then_read_back_through_both_paths() -> Result<()> {
    let dir = scratch_dir("read_back");
    write_movies(&dir)?;

    let indexed = StorageReader::open(&dir, 0, true)?;
    let linear = StorageReader::open(&dir, 0, false)?;
    for m in movies() {
        assert_eq!(indexed.read(&m.key)?, m);
        assert_eq!(linear.read(&m.key)?, m);
    }
    assert!(indexed.read("nope").is_err());
    assert!(linear.read("nope").is_err());

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_data_file_conserves_free_space() -> Result<()> {
    let dir = scratch_dir("conserve");
    write_movies(&dir)?;

    let bytes = fs::read(dir.join("data_0"))?;
    assert_eq!(bytes.len(), page::PAGE_SIZE);
    let free_space = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let record_bytes: usize = movies().iter().map(|m| page::encode_row(m).len()).sum();
    assert_eq!(free_space + record_bytes, page::RECORD_CAPACITY);
    // The tail past the records is all zeros.
    assert!(bytes[page::HEADER_SIZE + record_bytes..].iter().all(|b| *b == 0));

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_file_scan_plan_yields_every_row() -> Result<()> {
    let dir = scratch_dir("file_scan");
    write_movies(&dir)?;

    let q = format!(
        r#"{{"head": {{"name": "SCAN", "args": {{}}, "child": {{
            "name": "FILE_SCAN", "args": {{"dir": "{}", "file_number": "0"}}
        }}}}}}"#,
        dir.display()
    );
    assert_eq!(rowdb::run_query(&q)?, movies());

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_selection_and_predicate_over_a_page() -> Result<()> {
    let dir = scratch_dir("selection");
    let mut writer = StorageWriter::create(&dir, 0, true)?;
    let keep = movie("1", "Movie 1", "1", "2");
    let reject = movie("2", "Movie 2", "1", "1");
    assert!(writer.write(&keep)?);
    assert!(writer.write(&reject)?);
    writer.flush()?;

    let q = format!(
        r#"{{"head": {{"name": "SELECTION", "args": {{"AND": {{
            "EQ": ["Id", "1"],
            "AND": {{"EQ": ["Year", "2"]}}
        }}}}, "child": {{
            "name": "FILE_SCAN", "args": {{"dir": "{}", "file_number": "0"}}
        }}}}}}"#,
        dir.display()
    );
    assert_eq!(rowdb::run_query(&q)?, vec![keep]);

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_count_then_sort_pipeline() -> Result<()> {
    let dir = scratch_dir("count_sort");
    let mut writer = StorageWriter::create(&dir, 0, true)?;
    for m in [
        movie("1", "M", "1", "1"),
        movie("2", "M", "1", "2"),
        movie("3", "M", "3", "3"),
    ] {
        assert!(writer.write(&m)?);
    }
    writer.flush()?;

    let q = format!(
        r#"{{"head": {{"name": "SORT", "args": {{"sorted_args": ["Name:ASC", "Id:ASC"]}}, "child": {{
            "name": "COUNT", "args": ["Name", "Id"], "child": {{
                "name": "SCAN", "args": {{}}, "child": {{
                    "name": "FILE_SCAN", "args": {{"dir": "{}", "file_number": "0"}}
                }}
            }}
        }}}}}}"#,
        dir.display()
    );
    let rows = rowdb::run_query(&q)?;
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].columns,
        vec![
            (String::from("Name"), String::from("M")),
            (String::from("Id"), String::from("1")),
            (String::from("Count"), String::from("2")),
        ]
    );
    assert_eq!(
        rows[1].columns,
        vec![
            (String::from("Name"), String::from("M")),
            (String::from("Id"), String::from("3")),
            (String::from("Count"), String::from("1")),
        ]
    );

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_projection_and_limit_pipeline() -> Result<()> {
    let dir = scratch_dir("project_limit");
    write_movies(&dir)?;

    let q = format!(
        r#"{{"head": {{"name": "LIMIT", "args": ["2"], "child": {{
            "name": "PROJECTION", "args": ["Name"], "child": {{
                "name": "FILE_SCAN", "args": {{"dir": "{}", "file_number": "0"}}
            }}
        }}}}}}"#,
        dir.display()
    );
    let rows = rowdb::run_query(&q)?;
    assert_eq!(rows.len(), 2);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(
            row.columns,
            vec![(String::from("Name"), format!("Movie {}", i + 1))]
        );
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_capacity_refusal_keeps_earlier_rows_readable() -> Result<()> {
    let dir = scratch_dir("capacity");
    let mut writer = StorageWriter::create(&dir, 0, true)?;
    assert!(writer.write(&movie("1", "Movie 1", "1", "1"))?);
    let big = Row::new("big", vec![(String::from("blob"), "x".repeat(1200))]);
    assert!(!writer.write(&big)?);
    writer.flush()?;

    let reader = StorageReader::open(&dir, 0, true)?;
    assert_eq!(reader.read("1")?, movie("1", "Movie 1", "1", "1"));
    assert!(reader.read("big").is_err());

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_unknown_operator_yields_no_rows() -> Result<()> {
    let q = r#"{"head": {"name": "EXPLODE", "args": [], "child": null}}"#;
    assert_eq!(rowdb::run_query(q)?, vec![]);
    Ok(())
}

#[test]
fn test_index_survives_many_rows() -> Result<()> {
    // Enough inserts to force the index tree through several splits.
    let dir = scratch_dir("many_rows");
    let mut writer = StorageWriter::create(&dir, 0, true)?;
    let mut written = Vec::new();
    for i in 0..20 {
        let key = format!("{:02}", (i * 7) % 20);
        let row = Row::new(
            key.as_str(),
            vec![(String::from("N"), format!("row {}", key))],
        );
        assert!(writer.write(&row)?);
        written.push(row);
    }
    writer.flush()?;

    let reader = StorageReader::open(&dir, 0, true)?;
    for row in &written {
        assert_eq!(&reader.read(&row.key)?, row);
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}
