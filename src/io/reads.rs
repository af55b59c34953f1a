// Copyright 2014-2015 Johannes Köster, Peer Aramillo Irizar.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Simulated-read files: alternating metadata/sequence line pairs, each
//! metadata line carrying the read's true origin on the reference so the
//! alignment driver can score its own predictions.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::Rng;

use error::{Error, Result};

/// One simulated read: its identifier, ground-truth 1-based position on the
/// reference, and sequence (already cleaned of ambiguous bases).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadRecord {
    pub identifier: String,
    pub true_position: i64,
    pub sequence: Vec<u8>,
}

/// Parse a read file: odd lines (1-indexed) are whitespace-separated
/// metadata whose first token is the identifier and fourth token is
/// `pos=<integer>`; even lines are the read sequence. Any `N` in a sequence
/// is replaced by a uniformly random base from `{A, C, G, T}`, mirroring the
/// simulator's own handling of the rare ambiguous call.
///
/// Records are returned in file order, not grouped by identifier into a map:
/// nothing downstream needs random access, and file order is both
/// deterministic and exactly reproducible.
pub fn parse_reads<P: AsRef<Path>>(path: P) -> Result<Vec<ReadRecord>> {
    parse_reads_with_rng(path, &mut rand::thread_rng())
}

fn parse_reads_with_rng<P: AsRef<Path>, R: Rng>(path: P, rng: &mut R) -> Result<Vec<ReadRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut identifier = String::new();
    let mut true_position = 0i64;
    let mut total_lines = 0usize;

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = line_number + 1; // 1-indexed, matching the file format's convention
        total_lines = line_number;

        if line_number % 2 == 1 {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let id_field = fields
                .first()
                .ok_or(Error::MalformedReadRecord { line: line_number })?;
            let position_field = fields
                .get(3)
                .ok_or(Error::MalformedReadRecord { line: line_number })?;
            identifier = id_field.to_string();
            true_position = position_field
                .get(4..) // strip the leading "pos="
                .and_then(|s| s.parse().ok())
                .ok_or(Error::MalformedReadRecord { line: line_number })?;
        } else {
            if line.is_empty() {
                return Err(Error::EmptyRead);
            }
            let sequence = substitute_unknown_bases(line.as_bytes(), rng);
            for (position, &symbol) in sequence.iter().enumerate() {
                if !matches!(symbol, b'A' | b'C' | b'G' | b'T') {
                    return Err(Error::InvalidRead { position, symbol });
                }
            }
            records.push(ReadRecord {
                identifier: identifier.clone(),
                true_position,
                sequence,
            });
        }
    }

    if total_lines % 2 != 0 {
        return Err(Error::MalformedReadRecord { line: total_lines });
    }

    Ok(records)
}

fn substitute_unknown_bases<R: Rng>(sequence: &[u8], rng: &mut R) -> Vec<u8> {
    const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];
    sequence
        .iter()
        .map(|&b| if b == b'N' { BASES[rng.gen_range(0, 4)] } else { b })
        .collect()
}
