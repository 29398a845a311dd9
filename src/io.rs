//! Boundary layer: table-description parsing and address lexing.
//!
//! The core never touches text; everything here turns lines into the typed
//! model in [`crate::table`] and plain `u64` addresses.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::geometry::{Geometry, GeometryError};
use crate::table::{PageTable, PageTableEntry, Permissions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("table description is empty")]
    Empty,
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: flag {token:?} must be 0 or 1")]
    InvalidFlag { line: usize, token: String },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Read and parse a table description file.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<PageTable, LoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(parse_table(&content)?)
}

/// Parse a table description.
///
/// The first non-blank line is `<va_bits> <pa_bits> <page_size>`; every
/// following non-blank line is one entry, `<valid> <permissions> <frame>
/// <used>`, in page-number order. Blank lines are skipped anywhere.
pub fn parse_table(content: &str) -> Result<PageTable, ParseError> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (line_no, header) = lines.next().ok_or(ParseError::Empty)?;
    let geometry = parse_geometry_line(line_no + 1, header)?;

    let mut table = PageTable::new(geometry);
    for (line_no, line) in lines {
        table.push_entry(parse_entry_line(line_no + 1, line)?);
    }

    Ok(table)
}

/// Parse one address line: decimal, or hexadecimal with a `0x` prefix.
pub fn parse_address(text: &str) -> Result<u64, ParseError> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };

    parsed.map_err(|_| ParseError::InvalidAddress(text.to_string()))
}

fn parse_geometry_line(line: usize, text: &str) -> Result<Geometry, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(ParseError::FieldCount {
            line,
            expected: 3,
            found: tokens.len(),
        });
    }

    let va_bits: u32 = parse_number(line, tokens[0])?;
    let pa_bits: u32 = parse_number(line, tokens[1])?;
    let page_size: u64 = parse_number(line, tokens[2])?;

    Ok(Geometry::new(va_bits, pa_bits, page_size)?)
}

fn parse_entry_line(line: usize, text: &str) -> Result<PageTableEntry, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 4 {
        return Err(ParseError::FieldCount {
            line,
            expected: 4,
            found: tokens.len(),
        });
    }

    let valid = parse_flag(line, tokens[0])?;
    let permissions = Permissions::from_bits_retain(parse_number(line, tokens[1])?);
    let frame: u64 = parse_number(line, tokens[2])?;
    let used = parse_flag(line, tokens[3])?;

    Ok(PageTableEntry::new(valid, permissions, frame, used))
}

fn parse_number<T: std::str::FromStr>(line: usize, token: &str) -> Result<T, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

fn parse_flag(line: usize, token: &str) -> Result<bool, ParseError> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ParseError::InvalidFlag {
            line,
            token: token.to_string(),
        }),
    }
}
