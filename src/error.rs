// Copyright 2014-2015 Johannes Köster, Peer Aramillo Irizar.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The error type returned by the fallible parts of this crate: reference and
//! read I/O, and the validity checks the spec requires before a search runs.

use thiserror::Error;

/// Errors surfaced by reference/read parsing and by the search engine's own
/// input validation (malformed input per the spec's error handling design;
/// the engine itself is total over clean input, so `Error` only ever
/// originates in `io` or in the validity checks the CLI binaries run before
/// calling into the engine).
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read input file")]
    Io(#[from] std::io::Error),

    #[error("read is empty")]
    EmptyRead,

    #[error("reference contains invalid symbol {symbol:?} at position {position}")]
    InvalidReference { position: usize, symbol: u8 },

    #[error("read contains invalid symbol {symbol:?} at position {position}")]
    InvalidRead { position: usize, symbol: u8 },

    #[error("malformed read record at line {line}")]
    MalformedReadRecord { line: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
