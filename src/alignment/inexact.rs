// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Bounded-error approximate matching: the `D`-array lower bound and the
//! branch-and-bound recursion that uses it to prune a backward search over
//! match, mismatch, insertion and deletion moves.
//!
//! This is the hard part of the crate. Everything in `data_structures` exists
//! to make the two functions here — [`d_array`] and [`inexact_search`] —
//! cheap to run for every read against the whole reference.

use std::cell::Cell;

use enum_map::EnumMap;
use fxhash::FxHashMap;

use data_structures::bwt::{Base, Less, Occ, BWT};
use data_structures::suffix_array::RawSuffixArray;

/// The move that produced a given recursion step, needed to tell a gap-open
/// from a gap-extension when charging affine gap penalties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Move {
    Start,
    Match,
    Mismatch,
    Insertion,
    Deletion,
}

/// Per-(read base, reference base) substitution weights, estimated once per
/// read/reference pair by [`estimate_substitution_weights`] and consulted as
/// `w(s[i], c)` in the mismatch penalty. `None` in [`Scoring`] means every
/// mismatch costs exactly `mismatch` (`w` implicitly 1 everywhere).
pub type SubstitutionWeights = EnumMap<Base, EnumMap<Base, f64>>;

/// The scoring scheme the search is run under: affine gap costs, a flat
/// mismatch cost (optionally scaled per base pair), and whether indels are
/// considered at all. Built once per run and threaded through the recursion
/// by reference; nothing here is mutated during a search.
#[derive(Clone, Debug)]
pub struct Scoring {
    pub gap_open: f64,
    pub gap_extend: f64,
    pub mismatch: f64,
    pub match_score: f64,
    pub allow_indels: bool,
    pub substitution_weights: Option<SubstitutionWeights>,
}

impl Scoring {
    /// The reference defaults: `gap_open = 3`, `gap_extend = 1`,
    /// `mismatch = 1`, `match = 0`, indels allowed, no substitution table.
    pub fn new(gap_open: f64, gap_extend: f64, mismatch: f64, match_score: f64) -> Self {
        Scoring {
            gap_open,
            gap_extend,
            mismatch,
            match_score,
            allow_indels: true,
            substitution_weights: None,
        }
    }

    /// A scheme with no gap-open charge: every gap position, first or not,
    /// costs a flat `gap_extend`. Corresponds to `search_bwt`'s
    /// `--linear-gaps` flag.
    pub fn linear_gaps(mismatch: f64, match_score: f64) -> Self {
        Scoring {
            gap_open: 0.0,
            gap_extend: 1.0,
            mismatch,
            match_score,
            allow_indels: true,
            substitution_weights: None,
        }
    }

    pub fn without_indels(mut self) -> Self {
        self.allow_indels = false;
        self
    }

    pub fn with_substitution_weights(mut self, weights: SubstitutionWeights) -> Self {
        self.substitution_weights = Some(weights);
        self
    }

    fn substitution_weight(&self, read_base: Base, ref_base: Base) -> f64 {
        match &self.substitution_weights {
            Some(table) => table[read_base][ref_base],
            None => 1.0,
        }
    }
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring::new(3.0, 1.0, 1.0, 0.0)
    }
}

/// Per-read lower bound on the number of edits needed to match the read's
/// suffix starting at each position, computed once before the main search so
/// the recursion can prune a branch as soon as its remaining budget falls
/// below what the rest of the read provably requires.
pub type DArray = Vec<i64>;

fn d_at(d: &DArray, i: isize) -> i64 {
    if i < 0 {
        0
    } else {
        d[i as usize]
    }
}

/// Build the `D`-array for `read` by backward-searching the *reversed*
/// reference: `C` is the first-column table of the (forward) reference, `O'`
/// is the rank table of the reversed reference's BWT, and `bwt_rev` is only
/// consulted for its length. Preserves the source algorithm's asymmetric
/// interval reset (`l` starts at `len(bwt) - 2`, but resets to
/// `len(bwt) - 1` on every edit) verbatim; see DESIGN.md.
pub fn d_array(read: &[Base], less: &Less, occ_rev: &Occ, bwt_rev: &BWT) -> DArray {
    let m = read.len();
    let mut d = vec![0i64; m];
    let mut k: i64 = 1;
    let mut l: i64 = bwt_rev.len() as i64 - 2;
    let mut z: i64 = 0;

    for (i, &base) in read.iter().enumerate() {
        k = less[base] as i64 + occ_rev.get_signed(bwt_rev, k - 1, base) as i64 + 1;
        l = less[base] as i64 + occ_rev.get_signed(bwt_rev, l, base) as i64;

        if k > l {
            k = 1;
            l = bwt_rev.len() as i64 - 1;
            z += 1;
        }

        d[i] = z;
    }

    d
}

/// A single terminal of the recursion: a row of the suffix array together
/// with the scoring budget still remaining when the read was fully consumed
/// along that path. Several recursion branches can land on the same row with
/// different remaining scores; [`inexact_search`] keeps only the best.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchHit {
    pub sa_index: usize,
    pub score: f64,
}

/// The outcome of one [`inexact_search`] call: deduplicated hits sorted by
/// descending remaining score (best first), and the number of branches the
/// `D`-array bound pruned, for `search_bwt --count-prunes`.
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
    pub prunes: u64,
}

struct SearchContext<'a> {
    bwt: &'a BWT,
    occ: &'a Occ,
    less: &'a Less,
    d: &'a DArray,
    scoring: &'a Scoring,
    prunes: Cell<u64>,
}

#[allow(clippy::too_many_arguments)]
fn inexact_recursion(
    ctx: &SearchContext,
    read: &[Base],
    i: isize,
    diff: f64,
    k: usize,
    l: usize,
    prev: Move,
    out: &mut Vec<SearchHit>,
) {
    if diff < d_at(ctx.d, i) as f64 {
        ctx.prunes.set(ctx.prunes.get() + 1);
        return;
    }

    if i < 0 {
        for row in k..=l {
            out.push(SearchHit {
                sa_index: row,
                score: diff,
            });
        }
        return;
    }

    if ctx.scoring.allow_indels {
        let insertion_cost = match prev {
            Move::Insertion => ctx.scoring.gap_extend,
            _ => ctx.scoring.gap_open + ctx.scoring.gap_extend,
        };
        inexact_recursion(
            ctx,
            read,
            i - 1,
            diff - insertion_cost,
            k,
            l,
            Move::Insertion,
            out,
        );
    }

    for &base in &Base::ALL {
        let temp_k = ctx.less[base] + ctx.occ.get_signed(ctx.bwt, k as i64 - 1, base) + 1;
        let temp_l = ctx.less[base] + ctx.occ.get_signed(ctx.bwt, l as i64, base);

        if temp_k > temp_l {
            continue;
        }

        if ctx.scoring.allow_indels {
            let deletion_cost = match prev {
                Move::Deletion => ctx.scoring.gap_extend,
                _ => ctx.scoring.gap_open + ctx.scoring.gap_extend,
            };
            inexact_recursion(
                ctx,
                read,
                i,
                diff - deletion_cost,
                temp_k,
                temp_l,
                Move::Deletion,
                out,
            );
        }

        let read_base = read[i as usize];
        if base == read_base {
            inexact_recursion(
                ctx,
                read,
                i - 1,
                diff + ctx.scoring.match_score,
                temp_k,
                temp_l,
                Move::Match,
                out,
            );
        } else {
            let penalty = ctx.scoring.mismatch * ctx.scoring.substitution_weight(read_base, base);
            inexact_recursion(
                ctx,
                read,
                i - 1,
                diff - penalty,
                temp_k,
                temp_l,
                Move::Mismatch,
                out,
            );
        }
    }
}

/// Deduplicate hits by suffix-array row, keeping the best (highest) score
/// seen for each row, then sort by descending score. The sort is stable, so
/// ties keep the order the recursion first produced them in — the fixed
/// A < C < G < T traversal order — making output order fully deterministic.
fn dedupe_by_max_score(raw: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut index_of: FxHashMap<usize, usize> = FxHashMap::default();
    let mut out: Vec<SearchHit> = Vec::new();

    for hit in raw {
        match index_of.get(&hit.sa_index) {
            Some(&pos) => {
                if hit.score > out[pos].score {
                    out[pos].score = hit.score;
                }
            }
            None => {
                index_of.insert(hit.sa_index, out.len());
                out.push(hit);
            }
        }
    }

    out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    out
}

/// Search `read` against the reference indexed by `(bwt, less, occ)`, using
/// `(bwt_rev, occ_rev)` only to build the `D`-array lower bound, starting
/// with `diff` units of scoring budget. Total over any non-empty `read` of
/// `Base`s; callers are responsible for rejecting empty reads (`io::reads`
/// does, via `Error::EmptyRead`) before this point, since the engine itself
/// makes no claim about what an empty read should mean.
pub fn inexact_search(
    bwt: &BWT,
    less: &Less,
    occ: &Occ,
    bwt_rev: &BWT,
    occ_rev: &Occ,
    read: &[Base],
    diff: f64,
    scoring: &Scoring,
) -> SearchResult {
    let d = d_array(read, less, occ_rev, bwt_rev);
    let ctx = SearchContext {
        bwt,
        occ,
        less,
        d: &d,
        scoring,
        prunes: Cell::new(0),
    };

    let mut raw = Vec::new();
    if !read.is_empty() {
        let last = read.len() as isize - 1;
        inexact_recursion(&ctx, read, last, diff, 0, bwt.len() - 1, Move::Start, &mut raw);
    }

    SearchResult {
        hits: dedupe_by_max_score(raw),
        prunes: ctx.prunes.get(),
    }
}

/// Reduce a [`SearchResult`] to the single best hit, as a 1-based reference
/// position and its remaining score. `(-1, -1.0)` means no hit survived the
/// budget — the spec's "no match" sentinel, distinct from the driver-level
/// "-2" ambiguous-tie sentinel that only `align_reads` computes.
pub fn best_match_position(result: &SearchResult, sa: &RawSuffixArray) -> (i64, f64) {
    match result.hits.first() {
        Some(hit) => (sa[hit.sa_index] as i64 + 1, hit.score),
        None => (-1, -1.0),
    }
}

/// Estimate a substitution-weight table from a reference/read pair: count,
/// for every ordered pair `(read_base, ref_base)` with `read_base !=
/// ref_base`, how often that pair of bases differs across all
/// reference-position x read-position combinations, then normalize by the
/// largest count so weights fall in `[0, 1]`. Consulted by the search as
/// `w(s[i], c)` — the table is keyed to match that usage directly, rather
/// than the transposed `(ref_base, read_base)` key the counting loop might
/// suggest; see DESIGN.md.
pub fn estimate_substitution_weights(reference: &[Base], read: &[Base]) -> SubstitutionWeights {
    let mut counts: EnumMap<Base, EnumMap<Base, u64>> = EnumMap::default();

    for &ref_base in reference {
        for &read_base in read {
            if ref_base != read_base {
                counts[read_base][ref_base] += 1;
            }
        }
    }

    let max = counts
        .values()
        .flat_map(|row| row.values().cloned())
        .max()
        .unwrap_or(0);

    let mut weights: SubstitutionWeights = EnumMap::default();
    if max > 0 {
        for &read_base in &Base::ALL {
            for &ref_base in &Base::ALL {
                weights[read_base][ref_base] = counts[read_base][ref_base] as f64 / max as f64;
            }
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_structures::bwt::{bwt, less, totals, SENTINEL};
    use data_structures::fmindex::FMIndex;
    use data_structures::suffix_array::suffix_array;

    fn to_bases(text: &[u8]) -> Vec<Base> {
        text.iter().map(|&b| Base::from_symbol(b).unwrap()).collect()
    }

    struct Index {
        sa: RawSuffixArray,
        bw: BWT,
        less: Less,
        occ: Occ,
        bw_rev: BWT,
        occ_rev: Occ,
    }

    fn build_index(reference: &[u8]) -> Index {
        let mut forward = reference.to_vec();
        forward.push(SENTINEL);
        let sa = suffix_array(&forward);
        let bw = bwt(&forward, &sa);
        let lt = less(&totals(&bw));
        let occ = Occ::new(&bw, 1);

        let mut reversed: Vec<u8> = reference.iter().rev().cloned().collect();
        reversed.push(SENTINEL);
        let sa_rev = suffix_array(&reversed);
        let bw_rev = bwt(&reversed, &sa_rev);
        let occ_rev = Occ::new(&bw_rev, 1);

        Index {
            sa,
            bw,
            less: lt,
            occ,
            bw_rev,
            occ_rev,
        }
    }

    // Invariant 7: D is monotonically non-decreasing in i.
    #[test]
    fn test_d_array_is_non_decreasing() {
        let reference = b"CGATCCGCGCTGCTGATGATCGATG";
        let idx = build_index(reference);
        let read = to_bases(b"GATGATTTACG"); // trailing bases don't occur in the reference

        let d = d_array(&read, &idx.less, &idx.occ_rev, &idx.bw_rev);

        assert_eq!(d.len(), read.len());
        let mut prev = 0;
        for &z in &d {
            assert!(z >= prev);
            prev = z;
        }
        // the unmatchable run of bases must force the lower bound above zero
        // somewhere, or the bound would be vacuously trivial.
        assert!(*d.last().unwrap() > 0);
    }

    // D-array of a read drawn entirely from the reference alphabet and fully
    // present in the reference never forces an edit: the exact-match budget
    // of zero must stay admissible throughout.
    #[test]
    fn test_d_array_stays_zero_for_a_fully_exact_read() {
        let reference = b"ACGTACGTACGT";
        let idx = build_index(reference);
        let read = to_bases(b"ACGT");

        let d = d_array(&read, &idx.less, &idx.occ_rev, &idx.bw_rev);

        assert_eq!(d, vec![0, 0, 0, 0]);
    }

    // S1: exact match at all three occurrences, zero budget.
    #[test]
    fn test_exact_match_reports_all_occurrences() {
        let reference = b"ACGTACGTACGT";
        let idx = build_index(reference);
        let read = to_bases(b"ACGT");

        let result = inexact_search(
            &idx.bw,
            &idx.less,
            &idx.occ,
            &idx.bw_rev,
            &idx.occ_rev,
            &read,
            0.0,
            &Scoring::new(3.0, 1.0, 1.0, 0.0),
        );

        let mut positions: Vec<i64> = result
            .hits
            .iter()
            .map(|h| idx.sa[h.sa_index] as i64 + 1)
            .collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![1, 5, 9]);
        for hit in &result.hits {
            assert_eq!(hit.score, 0.0);
        }
    }

    // S2: a single mismatch is tolerated within budget 1.
    #[test]
    fn test_single_mismatch_within_budget() {
        let reference = b"ACGTACGTACGT";
        let idx = build_index(reference);
        let read = to_bases(b"ACGA"); // last base mismatches T

        let result = inexact_search(
            &idx.bw,
            &idx.less,
            &idx.occ,
            &idx.bw_rev,
            &idx.occ_rev,
            &read,
            1.0,
            &Scoring::new(3.0, 1.0, 1.0, 0.0),
        );

        let (position, score) = best_match_position(&result, &idx.sa);
        assert!(position == 1 || position == 5 || position == 9);
        assert_eq!(score, 0.0); // budget 1 spent entirely on the mismatch
    }

    // S5: insufficient budget yields no match at all.
    #[test]
    fn test_budget_exhaustion_yields_no_match() {
        let reference = b"ACGTACGTACGT";
        let idx = build_index(reference);
        let read = to_bases(b"TTTT"); // matches nowhere, even loosely

        let result = inexact_search(
            &idx.bw,
            &idx.less,
            &idx.occ,
            &idx.bw_rev,
            &idx.occ_rev,
            &read,
            0.0,
            &Scoring::new(3.0, 1.0, 1.0, 0.0),
        );

        assert_eq!(best_match_position(&result, &idx.sa), (-1, -1.0));
    }

    // S3: a single deletion (read is reference with one base removed) costs
    // exactly gap_open + gap_extend and is found within that budget.
    #[test]
    fn test_single_deletion_within_budget() {
        let reference = b"CGATCCGCGCTGCTGATGATCGATG";
        let idx = build_index(reference);
        // drop the 'A' at reference offset 1: "CGATCC..." -> "CGTCC..."
        let read = to_bases(b"CGTCCGCGCTGCTGATGATCGATG");

        let scoring = Scoring::new(3.0, 1.0, 1.0, 0.0);
        let budget = scoring.gap_open + scoring.gap_extend;
        let result = inexact_search(
            &idx.bw,
            &idx.less,
            &idx.occ,
            &idx.bw_rev,
            &idx.occ_rev,
            &read,
            budget,
            &scoring,
        );

        let (position, _) = best_match_position(&result, &idx.sa);
        assert_eq!(position, 1);
    }

    // S3: an exact occurrence of the read is still the best-scoring hit
    // even when the budget would tolerate edits elsewhere.
    #[test]
    fn test_best_hit_prefers_exact_occurrence_within_budget() {
        let reference = b"CGATCCGCGCTGCTGATGATCGATG";
        let idx = build_index(reference);
        let read = to_bases(b"GATGAT");

        let result = inexact_search(
            &idx.bw,
            &idx.less,
            &idx.occ,
            &idx.bw_rev,
            &idx.occ_rev,
            &read,
            2.0,
            &Scoring::new(3.0, 1.0, 1.0, 0.0),
        );

        let (position, score) = best_match_position(&result, &idx.sa);
        assert_eq!(position, 15);
        assert_eq!(score, 0.0);
    }

    // Invariant 8: with z=0 and indels disabled, inexact search reduces to
    // exact match, agreeing exactly with FMIndex::backward_search.
    #[test]
    fn test_no_indels_zero_budget_agrees_with_exact_backward_search() {
        let reference = b"CGATCCGCGCTGCTGATGATCGATG";
        let idx = build_index(reference);
        let pattern = b"GATGAT";
        let read = to_bases(pattern);

        let result = inexact_search(
            &idx.bw,
            &idx.less,
            &idx.occ,
            &idx.bw_rev,
            &idx.occ_rev,
            &read,
            0.0,
            &Scoring::new(3.0, 1.0, 1.0, 0.0).without_indels(),
        );

        let mut inexact_positions: Vec<usize> = result
            .hits
            .iter()
            .map(|hit| idx.sa[hit.sa_index])
            .collect();
        inexact_positions.sort_unstable();

        let fm = FMIndex::new(&idx.bw, &idx.occ, &idx.less);
        let mut exact_positions = fm.backward_search(pattern).occ(&idx.sa);
        exact_positions.sort_unstable();

        assert_eq!(inexact_positions, exact_positions);
        assert!(!exact_positions.is_empty());
        for hit in &result.hits {
            assert_eq!(hit.score, 0.0);
        }
    }

    #[test]
    fn test_without_indels_rejects_deletion() {
        let reference = b"CGATCCGCGCTGCTGATGATCGATG";
        let idx = build_index(reference);
        let read = to_bases(b"CGTCCGCGCTGCTGATGATCGATG");

        let scoring = Scoring::new(3.0, 1.0, 1.0, 0.0).without_indels();
        let budget = scoring.gap_open + scoring.gap_extend;
        let result = inexact_search(
            &idx.bw,
            &idx.less,
            &idx.occ,
            &idx.bw_rev,
            &idx.occ_rev,
            &read,
            budget,
            &scoring,
        );

        assert_eq!(best_match_position(&result, &idx.sa), (-1, -1.0));
    }

    #[test]
    fn test_dedupe_keeps_best_score_per_row() {
        let raw = vec![
            SearchHit { sa_index: 2, score: -1.0 },
            SearchHit { sa_index: 0, score: 0.0 },
            SearchHit { sa_index: 2, score: 0.0 },
        ];
        let deduped = dedupe_by_max_score(raw);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].score, 0.0);
        assert_eq!(deduped[1].score, 0.0);
    }

    #[test]
    fn test_substitution_weights_normalized_to_unit_max() {
        let reference = to_bases(b"AAAACCCC");
        let read = to_bases(b"GGGGGGGG");
        let weights = estimate_substitution_weights(&reference, &read);
        // G read base vs A ref base: 4*8=32 mismatches; G vs C: 4*8=32; equal max.
        assert_eq!(weights[Base::G][Base::A], 1.0);
        assert_eq!(weights[Base::G][Base::C], 1.0);
        // no G bases appear in the reference, so A/C/T read-base rows stay zero.
        assert_eq!(weights[Base::A][Base::C], 0.0);
    }
}
