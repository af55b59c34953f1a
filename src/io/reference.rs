// Copyright 2014-2015 Johannes Köster, Peer Aramillo Irizar.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Reference genome loading: a reference file is just the sequence, one or
//! more lines, newlines stripped and concatenated.

use std::fs::File;
use std::io::Read as IoRead;
use std::path::Path;

use error::{Error, Result};

/// Read and concatenate every line of `path`, validating that only `A`, `C`,
/// `G` and `T` appear (uppercase only: the reference is assumed already
/// normalized, unlike reads, which still carry the occasional ambiguous
/// `N`).
pub fn read_reference<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;

    let mut reference = Vec::with_capacity(contents.len());
    for line in contents.lines() {
        reference.extend_from_slice(line.as_bytes());
    }

    for (position, &symbol) in reference.iter().enumerate() {
        if !matches!(symbol, b'A' | b'C' | b'G' | b'T') {
            return Err(Error::InvalidReference { position, symbol });
        }
    }

    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_reference_strips_newlines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ACGT").unwrap();
        writeln!(file, "ACGT").unwrap();

        let reference = read_reference(file.path()).unwrap();
        assert_eq!(reference, b"ACGTACGT");
    }

    #[test]
    fn test_read_reference_rejects_invalid_symbol() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ACGN").unwrap();

        let err = read_reference(file.path()).unwrap_err();
        match err {
            Error::InvalidReference { position, symbol } => {
                assert_eq!(position, 3);
                assert_eq!(symbol, b'N');
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
