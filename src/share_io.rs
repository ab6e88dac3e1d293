//! Text-file persistence for shares and triple material.
//!
//! Formats (UTF-8, LF-terminated lines, decimal integers):
//! - scalar share file: one line with a single value;
//! - vector share file: a count line `N`, then N value lines;
//! - triple file: a count line `N`, then N lines of the form `a,b,c`.
//!
//! Writes overwrite atomically by default: the block is staged into a
//! sibling `.tmp` file and renamed into place. [`WriteMode::Append`] instead
//! adds a complete block at the end of the file; appended blocks are read
//! back by calling the `*_from` readers repeatedly on one `BufRead`.

use crate::errors::Error;
use crate::sharing::BeaverTriple;
use itertools::Itertools;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Whether a write replaces the file or extends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file contents atomically.
    Overwrite,
    /// Add a block at the end, creating the file if needed.
    Append,
}

fn write_block(path: &Path, mode: WriteMode, block: &str) -> Result<(), Error> {
    match mode {
        WriteMode::Overwrite => {
            let tmp = path.with_extension("tmp");
            let mut file = File::create(&tmp)?;
            file.write_all(block.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&tmp, path)?;
        }
        WriteMode::Append => {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(block.as_bytes())?;
        }
    }
    Ok(())
}

fn parse_line<B: BufRead>(reader: &mut B, line_no: usize) -> Result<String, Error> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Err(Error::Parse {
            line: line_no,
            msg: "unexpected end of file".to_string(),
        });
    }
    Ok(line.trim_end().to_string())
}

fn parse_u32(text: &str, line_no: usize) -> Result<u32, Error> {
    text.trim().parse::<u32>().map_err(|e| Error::Parse {
        line: line_no,
        msg: format!("bad integer {:?}: {}", text, e),
    })
}

/// Write a single scalar share.
pub fn write_value(path: &Path, v: u32, mode: WriteMode) -> Result<(), Error> {
    write_block(path, mode, &format!("{}\n", v))
}

/// Read a single scalar share.
pub fn read_value(path: &Path) -> Result<u32, Error> {
    let mut reader = BufReader::new(File::open(path)?);
    let line = parse_line(&mut reader, 1)?;
    parse_u32(&line, 1)
}

/// Write a vector share block: count line, then one value per line.
pub fn write_values(path: &Path, values: &[u32], mode: WriteMode) -> Result<(), Error> {
    let mut block = format!("{}\n", values.len());
    for v in values {
        block.push_str(&format!("{}\n", v));
    }
    write_block(path, mode, &block)
}

/// Read one vector share block from `reader`.
///
/// Line numbers in errors are relative to the start of the block.
pub fn read_values_from<B: BufRead>(reader: &mut B) -> Result<Vec<u32>, Error> {
    let count = parse_u32(&parse_line(reader, 1)?, 1)? as usize;
    (0..count)
        .map(|i| {
            let line_no = i + 2;
            parse_u32(&parse_line(reader, line_no)?, line_no)
        })
        .collect()
}

/// Read the first vector share block of a file.
pub fn read_values(path: &Path) -> Result<Vec<u32>, Error> {
    read_values_from(&mut BufReader::new(File::open(path)?))
}

/// Write a triple block: count line, then one `a,b,c` line per triple.
pub fn write_triples(path: &Path, triples: &[BeaverTriple], mode: WriteMode) -> Result<(), Error> {
    let mut block = format!("{}\n", triples.len());
    for t in triples {
        block.push_str(&format!("{},{},{}\n", t.a, t.b, t.c));
    }
    write_block(path, mode, &block)
}

/// Read one triple block from `reader`.
pub fn read_triples_from<B: BufRead>(reader: &mut B) -> Result<Vec<BeaverTriple>, Error> {
    let count = parse_u32(&parse_line(reader, 1)?, 1)? as usize;
    (0..count)
        .map(|i| {
            let line_no = i + 2;
            let line = parse_line(reader, line_no)?;
            let parts = line.split(',').collect_vec();
            if parts.len() != 3 {
                return Err(Error::Parse {
                    line: line_no,
                    msg: format!("expected a,b,c (got {:?})", line),
                });
            }
            Ok(BeaverTriple::new(
                parse_u32(parts[0], line_no)?,
                parse_u32(parts[1], line_no)?,
                parse_u32(parts[2], line_no)?,
            ))
        })
        .collect()
}

/// Read the first triple block of a file.
pub fn read_triples(path: &Path) -> Result<Vec<BeaverTriple>, Error> {
    read_triples_from(&mut BufReader::new(File::open(path)?))
}
