//! Text stage throughput.
//!
//! Times normalization, analysis and full preparation over a file of
//! complaint narratives, one per line. No model bundle is needed.
//!
//! ```bash
//! ./target/release/pipeline_bench narratives.txt [profile.json]
//! ```
//!
//! ```text
//! === prepare ===
//! elapsed     : 1.204 s
//! throughput  : 41.52 MiB/s
//! lines/sec   : 58_311
//! words/sec   : 9_402_117
//! ```

use std::env;
use std::fs;
use std::hint::black_box;
use std::time::{Duration, Instant};

use finclass_core::analyzer::{LexicalAnalyzer, StopwordSet};
use finclass_core::{EnglishAnalyzer, NormalizationProfile, Preprocessor, TextNormalizer};

const WARMUP_RUNS: usize = 1;
const MEASURE_RUNS: u32 = 5;

struct Corpus<'a> {
    lines: Vec<&'a str>,
    bytes: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: pipeline_bench <narratives.txt> [profile.json]");
        std::process::exit(1);
    };
    let profile = match args.next() {
        Some(profile) => serde_json::from_str(&fs::read_to_string(profile)?)?,
        None => NormalizationProfile::default(),
    };

    let input = fs::read_to_string(&path)?;
    let corpus = Corpus {
        lines: input.lines().filter(|l| !l.trim().is_empty()).collect(),
        bytes: input.len(),
    };
    println!("profile : {} ({})", profile.id(), &profile.fingerprint()[..12]);
    println!("size    : {}", fmt_bytes(corpus.bytes as u64));
    println!("lines   : {}\n", fmt_count(corpus.lines.len() as u64));

    let normalizer = TextNormalizer::new(profile.normalizer.clone());
    let mut buf = String::with_capacity(4096);
    stage("normalize", &corpus, || {
        for line in &corpus.lines {
            normalizer.normalize_into(line, &mut buf);
            black_box(&buf);
        }
        0
    });

    let analyzer = EnglishAnalyzer::new(StopwordSet::from_source(profile.stopwords));
    let normalized: Vec<String> = corpus.lines.iter().map(|l| normalizer.normalize(l)).collect();
    stage("analyze", &corpus, || {
        let mut words = 0u64;
        for line in &normalized {
            analyzer.analyze(line, &mut |token| {
                words += 1;
                black_box(token);
            });
        }
        words
    });

    let preprocessor = Preprocessor::from_profile(&profile);
    stage("prepare", &corpus, || {
        let mut words = 0u64;
        for line in &corpus.lines {
            let prepared = preprocessor.prepare(line);
            words += prepared.canonical.split(' ').filter(|w| !w.is_empty()).count() as u64;
            black_box(prepared);
        }
        words
    });

    Ok(())
}

/// Runs `pass` for warmup, then averages `MEASURE_RUNS` timed passes.
/// `pass` returns the number of words it produced, or 0 to omit the rate.
fn stage(label: &str, corpus: &Corpus<'_>, mut pass: impl FnMut() -> u64) {
    for _ in 0..WARMUP_RUNS {
        black_box(pass());
    }

    let mut total = Duration::ZERO;
    let mut words = 0;
    for _ in 0..MEASURE_RUNS {
        let start = Instant::now();
        words = pass();
        total += start.elapsed();
    }
    let secs = (total / MEASURE_RUNS).as_secs_f64().max(f64::EPSILON);

    println!("=== {label} ===");
    println!("elapsed     : {secs:.3} s");
    println!(
        "throughput  : {:.2} MiB/s",
        corpus.bytes as f64 / (1024.0 * 1024.0) / secs
    );
    println!(
        "lines/sec   : {}",
        fmt_count((corpus.lines.len() as f64 / secs) as u64)
    );
    if words > 0 {
        println!("words/sec   : {}", fmt_count((words as f64 / secs) as u64));
    }
    println!();
}

fn fmt_bytes(b: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    let mut value = b as f64;
    let mut unit = None;
    for name in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = Some(name);
    }
    match unit {
        Some(unit) => format!("{value:.2} {unit}"),
        None => format!("{b} B"),
    }
}

fn fmt_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('_');
        }
        out.push(ch);
    }
    out
}
