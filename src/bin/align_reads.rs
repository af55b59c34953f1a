// Copyright 2014-2016 Johannes Köster, Peer Aramillo Irizar.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Align a whole file of simulated reads against a reference genome and
//! report how the predictions compare to their recorded ground truth.
//!
//! Usage: `align_reads <genome-file> <reads-file> [-t <threshold>]`

use std::env;
use std::process;

use anyhow::{anyhow, Context, Result};

use fmalign::alignment::inexact::Scoring;
use fmalign::alphabets::dna;
use fmalign::data_structures::bwt::Base;
use fmalign::index::ReferenceIndex;
use fmalign::io::{reads, reference};
use fmalign::stats::AlignmentStats;

const DEFAULT_THRESHOLD: f64 = 3.0;

fn usage() -> String {
    "usage: align_reads <genome file name> <read file name> [-t <threshold level>]".to_string()
}

fn parse_args(args: &[String]) -> Result<(String, String, f64)> {
    let mut positional: Vec<&String> = Vec::new();
    let mut threshold = DEFAULT_THRESHOLD;
    let mut i = 0;
    while i < args.len() {
        if args[i] == "-t" {
            i += 1;
            threshold = args
                .get(i)
                .ok_or_else(|| anyhow!(usage()))?
                .parse()
                .context("threshold must be a number")?;
        } else {
            positional.push(&args[i]);
        }
        i += 1;
    }

    if positional.len() != 2 {
        return Err(anyhow!(usage()));
    }

    Ok((positional[0].clone(), positional[1].clone(), threshold))
}

/// Resolve which strand's alignment to trust, reproducing the driver's
/// tie-break exactly: prefer the forward strand whenever it is at least as
/// good and actually matched; fall back to the reverse complement only when
/// it strictly outscores the forward strand; if neither matched, report "no
/// match"; if both matched with an otherwise-untiebroken outcome, report a
/// read error.
fn resolve_strand(
    forward: (i64, f64),
    reverse: (i64, f64),
) -> i64 {
    let (position1, score1) = forward;
    let (position2, score2) = reverse;

    if score1 >= score2 && score1 != -1.0 {
        position1
    } else if score1 < score2 {
        position2
    } else if score1 == score2 && score1 == -1.0 {
        -1
    } else {
        -2
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (genome_file, reads_file, threshold) = parse_args(&args)?;

    println!("Calculating BWT, BWT reverse, suffix array, and aligning reads...");

    let reference = reference::read_reference(&genome_file)
        .with_context(|| format!("failed to read reference file {}", genome_file))?;
    let records = reads::parse_reads(&reads_file)
        .with_context(|| format!("failed to read reads file {}", reads_file))?;

    let index = ReferenceIndex::new(&reference);
    let scoring = Scoring::default();

    let mut stats = AlignmentStats::new();
    for record in &records {
        let forward_bases: Vec<Base> = record
            .sequence
            .iter()
            .map(|&b| Base::from_symbol(b).expect("reads are validated during parsing"))
            .collect();
        let reverse_complement = dna::revcomp(record.sequence.iter());
        let reverse_bases: Vec<Base> = reverse_complement
            .iter()
            .map(|&b| Base::from_symbol(b).expect("revcomp preserves the DNA alphabet"))
            .collect();

        let forward = index.best_position(&forward_bases, threshold, &scoring);
        let reverse = index.best_position(&reverse_bases, threshold, &scoring);

        let predicted = resolve_strand(forward, reverse);
        stats.record(predicted, record.true_position);
    }

    println!("\nResults (threshold={})...", threshold);
    println!("{}", stats);

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        process::exit(1);
    }
}
