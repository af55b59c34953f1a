// Copyright 2014-2015 Johannes Köster, Peer Aramillo Irizar.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Aggregate outcome counts for a batch alignment run, as reported by
//! `align_reads`.

use std::fmt;

/// Tally of how a batch of reads, each with a known true position, was
/// classified once aligned: exactly right, confidently wrong, no hit within
/// budget, or an ambiguous tie between the two strands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlignmentStats {
    pub total: usize,
    pub correct: usize,
    pub no_match: usize,
    pub incorrect: usize,
    pub read_error: usize,
}

impl AlignmentStats {
    pub fn new() -> Self {
        AlignmentStats::default()
    }

    /// Record the outcome of one read: `predicted` is the driver's chosen
    /// position (`-1` for no match, `-2` for an ambiguous strand tie),
    /// `true_position` its recorded ground truth.
    pub fn record(&mut self, predicted: i64, true_position: i64) {
        self.total += 1;
        if predicted == true_position {
            self.correct += 1;
        } else if predicted == -1 {
            self.no_match += 1;
        } else if predicted == -2 {
            self.read_error += 1;
        } else {
            self.incorrect += 1;
        }
    }
}

impl fmt::Display for AlignmentStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Number of reads: \t\t\t{}", self.total)?;
        writeln!(f, "Number of correct alignments: \t\t{}", self.correct)?;
        writeln!(f, "Number of 'no matches': \t\t{}", self.no_match)?;
        writeln!(f, "Number of incorrect predictions: \t{}", self.incorrect)?;
        write!(f, "Number of read errors: \t\t\t{}", self.read_error)
    }
}
