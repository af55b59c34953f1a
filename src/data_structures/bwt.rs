// Copyright 2014-2015 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The Burrows-Wheeler transform and the rank/first-column auxiliary tables
//! built on top of it.

use bytecount;
use enum_map::{Enum, EnumMap};

use data_structures::suffix_array::RawSuffixArray;

/// Terminal sentinel, lexicographically smaller than every alphabet symbol.
pub const SENTINEL: u8 = b'$';

/// The Burrows-Wheeler transform of a sentinel-terminated text.
pub type BWT = Vec<u8>;

/// The four symbols of the DNA alphabet indexed by the tables below. `$` is
/// deliberately not a variant: the spec requires that rank queries and
/// backward-search transitions never touch the sentinel, so making it
/// unrepresentable here is preferred over a runtime check.
#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    /// All four bases, in the fixed alphabet order A < C < G < T that the
    /// spec's `C` table and the search recursion's symbol iteration both
    /// rely on.
    pub const ALL: [Base; 4] = [Base::A, Base::C, Base::G, Base::T];

    /// Map an ASCII nucleotide byte to a `Base`, or `None` for anything else
    /// (including the sentinel).
    pub fn from_symbol(symbol: u8) -> Option<Base> {
        match symbol {
            b'A' => Some(Base::A),
            b'C' => Some(Base::C),
            b'G' => Some(Base::G),
            b'T' => Some(Base::T),
            _ => None,
        }
    }

    /// The ASCII byte for this base.
    pub fn symbol(self) -> u8 {
        match self {
            Base::A => b'A',
            Base::C => b'C',
            Base::G => b'G',
            Base::T => b'T',
        }
    }
}

/// Per-symbol occurrence counts over a whole BWT string (`T` in the spec).
pub type Totals = EnumMap<Base, usize>;

/// First-column table (`C` in the spec): `less[c]` is the number of BWT
/// symbols strictly lexicographically smaller than `c`.
pub type Less = EnumMap<Base, usize>;

/// Compute the BWT of `text` given its suffix array. Pure function of `sa`
/// alone, as required: `bwt[i] = text[sa[i] - 1]` when `sa[i] > 0`, else `$`.
///
/// # Example
///
/// ```
/// use fmalign::data_structures::suffix_array::suffix_array;
/// use fmalign::data_structures::bwt::bwt;
///
/// let text = b"GCCTTAACATTATTACGCCTA$";
/// let sa = suffix_array(text);
/// let bw = bwt(text, &sa);
/// assert_eq!(bw.len(), text.len());
/// ```
pub fn bwt(text: &[u8], sa: &RawSuffixArray) -> BWT {
    sa.iter()
        .map(|&p| if p == 0 { SENTINEL } else { text[p - 1] })
        .collect()
}

/// Invert a BWT string back to the original sentinel-terminated text.
/// Used only to check the round-trip invariant; the search engine never
/// calls this.
pub fn invert_bwt(bw: &BWT) -> Vec<u8> {
    let tot = totals(bw);
    let lt = less(&tot);

    // rank[i] := number of occurrences of bw[i] within bw[0..=i]
    let mut rank = vec![0usize; bw.len()];
    let mut running: Totals = EnumMap::default();
    for (i, &c) in bw.iter().enumerate() {
        if let Some(base) = Base::from_symbol(c) {
            running[base] += 1;
            rank[i] = running[base];
        }
    }

    let mut row = 0;
    let mut text = Vec::with_capacity(bw.len());
    while bw[row] != SENTINEL {
        let c = bw[row];
        let base = Base::from_symbol(c).expect("BWT symbol outside {A,C,G,T,$}");
        text.push(c);
        row = lt[base] + rank[row] - 1;
    }
    text.push(SENTINEL);
    text.reverse();
    text
}

/// Count occurrences of each symbol in `bw`, skipping the sentinel.
pub fn totals(bw: &BWT) -> Totals {
    let mut t: Totals = EnumMap::default();
    t[Base::A] = bytecount::count(bw, Base::A.symbol());
    t[Base::C] = bytecount::count(bw, Base::C.symbol());
    t[Base::G] = bytecount::count(bw, Base::G.symbol());
    t[Base::T] = bytecount::count(bw, Base::T.symbol());
    t
}

/// Compute `C` from `T` over the fixed order A < C < G < T. Every symbol is
/// always a key (enum-map guarantee), satisfying the spec's "absent symbols
/// map to 0" requirement without a runtime check.
///
/// Note: despite its docstring in the original Python source ("number of
/// lexicographically *greater* symbols"), the canonical formula — and the
/// one the backward-search recursion actually relies on — is the number of
/// lexicographically *smaller* symbols. This is the behavior implemented
/// here; see DESIGN.md.
pub fn less(totals: &Totals) -> Less {
    let mut lt: Less = EnumMap::default();
    let mut acc = 0;
    for base in &Base::ALL {
        lt[*base] = acc;
        acc += totals[*base];
    }
    lt
}

/// Rank table `O`, checkpoint-sampled every `k` rows so memory is
/// `O(|B| / k)` instead of `O(|B|)` per symbol. `k = 1` stores an entry at
/// every row, reproducing the spec's literal "array of length `|B|`"
/// contract exactly; the sampled form is the "implementer may substitute
/// sampled rank + checkpoint reconstruction" freedom the spec calls out for
/// larger references.
pub struct Occ {
    checkpoints: EnumMap<Base, Vec<usize>>,
    k: usize,
}

impl Occ {
    /// Build checkpoints for `bw`, sampling every `k` rows (`k >= 1`).
    pub fn new(bw: &BWT, k: usize) -> Self {
        assert!(k >= 1, "sampling interval must be at least 1");
        let n = bw.len();
        let mut checkpoints: EnumMap<Base, Vec<usize>> = EnumMap::default();
        for base in &Base::ALL {
            checkpoints[*base] = Vec::with_capacity(n / k + 1);
        }

        let mut running: Totals = EnumMap::default();
        for (i, &c) in bw.iter().enumerate() {
            if let Some(base) = Base::from_symbol(c) {
                running[base] += 1;
            }
            if i % k == 0 {
                for base in &Base::ALL {
                    checkpoints[*base].push(running[*base]);
                }
            }
        }

        Occ { checkpoints, k }
    }

    /// Number of occurrences of `a` in `bw[0..=r]` (inclusive), i.e. `O[a][r]`.
    pub fn get(&self, bw: &BWT, r: usize, a: Base) -> usize {
        let checkpoint_row = (r / self.k) * self.k;
        let mut count = self.checkpoints[a][r / self.k];
        for &c in &bw[checkpoint_row + 1..=r] {
            if Base::from_symbol(c) == Some(a) {
                count += 1;
            }
        }
        count
    }

    /// As [`get`](Occ::get), but honors the spec's `O[c][i < 0] := 0`
    /// convention for a signed index, so callers don't special-case the
    /// boundary themselves.
    pub fn get_signed(&self, bw: &BWT, r: i64, a: Base) -> usize {
        if r < 0 {
            0
        } else {
            self.get(bw, r as usize, a)
        }
    }
}
