// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Bundles the forward and reverse index structures a search needs: the
//! suffix array and rank tables of the reference, and the rank table of the
//! reversed reference the `D`-array is built from. Both CLI binaries build
//! exactly one of these per reference and reuse it across every read.

use data_structures::bwt::{bwt, less, totals, Base, Less, Occ, BWT, SENTINEL};
use data_structures::suffix_array::{suffix_array, RawSuffixArray};
use alignment::inexact::{best_match_position, inexact_search, Scoring, SearchResult};

/// The checkpoint sampling interval used for every `Occ` table this module
/// builds. `1` reproduces the spec's literal per-row rank array; larger
/// values trade a linear scan per query for less memory, invisible to
/// anything downstream.
const RANK_SAMPLING_INTERVAL: usize = 32;

/// Everything a search needs against one reference: its suffix array and
/// rank tables, plus the reversed reference's rank table for the `D`-array.
pub struct ReferenceIndex {
    sa: RawSuffixArray,
    bwt: BWT,
    less: Less,
    occ: Occ,
    bwt_rev: BWT,
    occ_rev: Occ,
}

impl ReferenceIndex {
    /// Build every table this index needs from a raw (sentinel-free)
    /// reference sequence. `O(n log n)` from the naive suffix sort; see
    /// `data_structures::suffix_array` for the tradeoff.
    pub fn new(reference: &[u8]) -> Self {
        let mut forward = reference.to_vec();
        forward.push(SENTINEL);
        let sa = suffix_array(&forward);
        let bwt_fwd = bwt(&forward, &sa);
        let lt = less(&totals(&bwt_fwd));
        let occ = Occ::new(&bwt_fwd, RANK_SAMPLING_INTERVAL);

        let mut reversed: Vec<u8> = reference.iter().rev().cloned().collect();
        reversed.push(SENTINEL);
        let sa_rev = suffix_array(&reversed);
        let bwt_rev = bwt(&reversed, &sa_rev);
        let occ_rev = Occ::new(&bwt_rev, RANK_SAMPLING_INTERVAL);

        ReferenceIndex {
            sa,
            bwt: bwt_fwd,
            less: lt,
            occ,
            bwt_rev,
            occ_rev,
        }
    }

    /// Search `read` under `scoring`, starting with `diff` units of budget.
    pub fn search(&self, read: &[Base], diff: f64, scoring: &Scoring) -> SearchResult {
        inexact_search(
            &self.bwt,
            &self.less,
            &self.occ,
            &self.bwt_rev,
            &self.occ_rev,
            read,
            diff,
            scoring,
        )
    }

    /// Convenience wrapper: search and reduce straight to the best 1-based
    /// position and its remaining score.
    pub fn best_position(&self, read: &[Base], diff: f64, scoring: &Scoring) -> (i64, f64) {
        let result = self.search(read, diff, scoring);
        best_match_position(&result, &self.sa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_bases(text: &[u8]) -> Vec<Base> {
        text.iter().map(|&b| Base::from_symbol(b).unwrap()).collect()
    }

    #[test]
    fn test_best_position_finds_exact_match() {
        let index = ReferenceIndex::new(b"ACGTACGTACGT");
        let read = to_bases(b"ACGT");
        let (position, score) = index.best_position(&read, 0.0, &Scoring::default());
        assert!(position == 1 || position == 5 || position == 9);
        assert_eq!(score, 0.0);
    }

    // S4: a read present only on the reverse-complement strand is invisible
    // to a forward-strand-only search, but findable once reverse-complemented.
    #[test]
    fn test_reverse_complement_strand_recovers_match() {
        use alphabets::dna;

        let index = ReferenceIndex::new(b"GTTT");
        let read = to_bases(b"AAAC");
        let forward = index.best_position(&read, 0.0, &Scoring::default());
        assert_eq!(forward, (-1, -1.0));

        let revcomp = dna::revcomp(read.iter().map(|b| b.symbol()));
        let revcomp_bases = to_bases(&revcomp);
        let (position, score) = index.best_position(&revcomp_bases, 0.0, &Scoring::default());
        assert_eq!(position, 1);
        assert_eq!(score, 0.0);
    }
}
