//! Thin CLI over the rowdb library: load rows into a page directory, read
//! one row back by key, or run a JSON plan document.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rowdb::row::Row;
use rowdb::{StorageReader, StorageWriter};

#[derive(Parser)]
#[command(name = "rowdb", about = "A tiny page-file row store driven by JSON query plans.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load `key,Name=Value,...` lines into a fresh indexed page file.
    Load {
        /// Directory that holds the page files.
        dir: PathBuf,
        /// File with one row per line.
        input: PathBuf,
        /// Page file number to create.
        #[arg(long, default_value_t = 0)]
        file_number: u32,
    },
    /// Read one row by key through the index.
    Get {
        dir: PathBuf,
        key: String,
        #[arg(long, default_value_t = 0)]
        file_number: u32,
    },
    /// Run the JSON plan document in a file and print the result table.
    Query {
        plan: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Load {
            dir,
            input,
            file_number,
        } => load(&dir, &input, file_number),
        Command::Get {
            dir,
            key,
            file_number,
        } => get(&dir, &key, file_number),
        Command::Query { plan } => query(&plan),
    }
}

fn load(dir: &Path, input: &Path, file_number: u32) -> Result<()> {
    fs::create_dir_all(dir)?;
    let text =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let mut writer = StorageWriter::create(dir, file_number, true)?;
    let mut written = 0u32;
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let row = parse_line(line)?;
        if !writer.write(&row)? {
            bail!("Page {} is full after {} rows", file_number, written);
        }
        written += 1;
    }
    writer.flush()?;
    println!("Wrote {} rows to {}/data_{}", written, dir.display(), file_number);
    Ok(())
}

/// One row per line: the key, then `Name=Value` pairs, comma separated.
fn parse_line(line: &str) -> Result<Row> {
    let mut parts = line.split(',');
    let key = parts.next().unwrap_or_default().trim();
    if key.is_empty() {
        bail!("Missing row key in line {:?}", line);
    }
    let mut columns = Vec::new();
    for part in parts {
        let (name, value) = part
            .split_once('=')
            .with_context(|| format!("Expected Name=Value, got {:?}", part))?;
        columns.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok(Row::new(key, columns))
}

fn get(dir: &Path, key: &str, file_number: u32) -> Result<()> {
    let reader = StorageReader::open(dir, file_number, true)?;
    let row = reader.read(key)?;
    println!("{}", row);
    Ok(())
}

fn query(plan: &Path) -> Result<()> {
    let document =
        fs::read_to_string(plan).with_context(|| format!("reading {}", plan.display()))?;
    let rows = rowdb::run_query(&document)?;
    print!("{}", rowdb::formatting::render_table(&rows));
    Ok(())
}

#[test]
fn test_parse_line() {
    let row = parse_line("1,Name=Movie 1,Id=1").unwrap();
    assert_eq!(row.key, "1");
    assert_eq!(row.column("Name"), Some("Movie 1"));
    assert_eq!(row.column("Id"), Some("1"));
    assert!(parse_line(",Name=x").is_err());
    assert!(parse_line("1,NoEquals").is_err());
}
