// Copyright 2014-2016 Johannes Köster, Peer Aramillo Irizar.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Search a single read against a single reference and print every
//! surviving hit.
//!
//! Usage: `search_bwt [--no-indels] [--linear-gaps] [--no-sub-mat] [-t <threshold>] (test | <reference-file> <read-file>) [--show-time] [--count-prunes]`

use std::env;
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};

use fmalign::alignment::inexact::{estimate_substitution_weights, Scoring};
use fmalign::data_structures::bwt::{Base, SENTINEL};
use fmalign::data_structures::suffix_array::suffix_array;
use fmalign::index::ReferenceIndex;
use fmalign::io::reference;

const DEFAULT_THRESHOLD: f64 = 3.0;

fn usage() -> &'static str {
    "usage: search_bwt [--no-indels] [--linear-gaps] [--no-sub-mat] [-t <threshold>] (test | <reference-file> <read-file>) [--show-time] [--count-prunes]"
}

fn to_bases(text: &[u8]) -> Vec<Base> {
    text.iter()
        .map(|&b| Base::from_symbol(b).expect("validated as pure ACGT before reaching here"))
        .collect()
}

fn print_hits(reference: &[u8], read: &[u8], hits: &[(i64, f64)]) {
    println!("\n-------------------------------------");
    println!("Reference: {}", String::from_utf8_lossy(reference));
    println!("Read: \t   {}\n", String::from_utf8_lossy(read));
    println!("{} match(es) found!\n", hits.len());
    println!("Score\tPos.\tSuffix\n");
    for &(position, score) in hits {
        let start = (position - 1) as usize;
        let end = (start + 35).min(reference.len());
        println!(
            "{}\t{}\t{}",
            score,
            position,
            String::from_utf8_lossy(&reference[start..end])
        );
    }
    println!("-------------------------------------");
}

fn run_search(reference: &[u8], read: &[u8], threshold: f64, scoring: &Scoring, show_time: bool, count_prunes: bool) {
    let index = ReferenceIndex::new(reference);
    let bases = to_bases(read);

    let started = Instant::now();
    let result = index.search(&bases, threshold, scoring);
    let elapsed = started.elapsed();

    let sa = suffix_array(&{
        let mut with_sentinel = reference.to_vec();
        with_sentinel.push(SENTINEL);
        with_sentinel
    });
    let hits: Vec<(i64, f64)> = result
        .hits
        .iter()
        .map(|hit| (sa[hit.sa_index] as i64 + 1, hit.score))
        .collect();

    print_hits(reference, read, &hits);

    if show_time {
        println!("time elapsed: {:?}", elapsed);
    }
    if count_prunes {
        println!("{} nodes pruned.", result.prunes);
    }
    println!("error score upper bound: {}", threshold);
}

fn run_self_test() {
    let reference = b"CGATCCGCGCTGCTGATGATCGATG";
    let read = b"GATGAT";
    run_search(reference, read, 2.0, &Scoring::default(), false, false);
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let flag = |name: &str| args.iter().any(|a| a == name);

    if args.is_empty() {
        println!("{}", usage());
        return Ok(());
    }

    if args[0].eq_ignore_ascii_case("test") {
        run_self_test();
        return Ok(());
    }

    let mut positional: Vec<&String> = Vec::new();
    let mut threshold = DEFAULT_THRESHOLD;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--no-indels" | "--linear-gaps" | "--no-sub-mat" | "--show-time" | "--count-prunes" => {}
            "-t" => {
                i += 1;
                threshold = args
                    .get(i)
                    .context(usage())?
                    .parse()
                    .context("threshold must be a number")?;
            }
            _ => positional.push(&args[i]),
        }
        i += 1;
    }

    if positional.len() != 2 {
        println!("{}", usage());
        return Ok(());
    }

    let reference_path = positional[0];
    let read_path = positional[1];

    let reference_seq = reference::read_reference(reference_path)
        .with_context(|| format!("failed to read reference file {}", reference_path))?;
    let read_seq = reference::read_reference(read_path)
        .with_context(|| format!("failed to read read file {}", read_path))?;

    let mut scoring = if flag("--linear-gaps") {
        Scoring::linear_gaps(1.0, 0.0)
    } else {
        Scoring::default()
    };
    if flag("--no-indels") {
        scoring = scoring.without_indels();
    }
    if !flag("--no-sub-mat") {
        let reference_bases = to_bases(&reference_seq);
        let read_bases = to_bases(&read_seq);
        scoring = scoring.with_substitution_weights(estimate_substitution_weights(
            &reference_bases,
            &read_bases,
        ));
    }

    run_search(
        &reference_seq,
        &read_seq,
        threshold,
        &scoring,
        flag("--show-time"),
        flag("--count-prunes"),
    );

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        process::exit(1);
    }
}
