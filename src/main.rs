//! ndstash - create, inspect and verify tagged array collection files
//!
//! Usage:
//!   ndstash create-pair two_arrays_dict.nds
//!   ndstash create-pair two_arrays_list.nds --list
//!   ndstash inspect two_arrays_dict.nds
//!   ndstash bench

use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use ndstash::protocol::{self, Decoder, Encoder};
use ndstash::storage::MappedFile;
use ndstash::{DecodeLimits, NdArray, NdList};

/// Tagged n-dimensional array collection files.
#[derive(Parser)]
#[command(name = "ndstash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    limits: LimitArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LimitArgs {
    /// Maximum number of entries accepted when decoding
    #[arg(long, global = true)]
    max_entries: Option<usize>,

    /// Maximum array rank accepted when decoding
    #[arg(long, global = true)]
    max_rank: Option<usize>,

    /// Maximum size in bytes of one array accepted when decoding
    #[arg(long, global = true)]
    max_array_bytes: Option<usize>,
}

impl LimitArgs {
    fn to_limits(&self) -> DecodeLimits {
        let mut limits = DecodeLimits::default();
        if let Some(n) = self.max_entries {
            limits = limits.with_max_entries(n);
        }
        if let Some(n) = self.max_rank {
            limits = limits.with_max_rank(n);
        }
        if let Some(n) = self.max_array_bytes {
            limits = limits.with_max_array_bytes(n);
        }
        limits
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a collection of `arange(stop)` arrays
    Create {
        /// Output file
        out: PathBuf,

        /// Number of arrays
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Exclusive upper bound of each arange
        #[arg(short, long, default_value = "25")]
        stop: i32,

        /// Name entries "array {i}" instead of leaving them unnamed
        #[arg(long)]
        named: bool,
    },

    /// Write the two-array fixture: keys "x" and "y", or unnamed with --list
    CreatePair {
        /// Output file
        out: PathBuf,

        /// Leave both entries unnamed
        #[arg(long)]
        list: bool,
    },

    /// Print the header and one line per entry
    Inspect {
        /// File to inspect
        file: PathBuf,
    },

    /// Decode, re-encode and check the bytes are identical
    Verify {
        /// File to verify
        file: PathBuf,
    },

    /// Measure encode/decode latency
    Bench {
        /// Iterations per measurement
        #[arg(short, long, default_value = "10000")]
        iterations: usize,

        /// Entries per collection
        #[arg(short, long, default_value = "10")]
        entries: usize,

        /// Elements per array
        #[arg(short, long, default_value = "25")]
        len: i32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let limits = cli.limits.to_limits();
    match cli.command {
        Commands::Create {
            out,
            count,
            stop,
            named,
        } => {
            let list: NdList = if named {
                (0..count)
                    .map(|i| (format!("array {i}"), NdArray::arange(stop)))
                    .collect()
            } else {
                (0..count).map(|_| NdArray::arange(stop)).collect()
            };
            write(&out, &list)
        }
        Commands::CreatePair { out, list } => {
            let pair: NdList = if list {
                (0..2).map(|_| NdArray::arange(25)).collect()
            } else {
                [("x", NdArray::arange(25)), ("y", NdArray::arange(25))]
                    .into_iter()
                    .collect()
            };
            write(&out, &pair)
        }
        Commands::Inspect { file } => inspect(&file, limits),
        Commands::Verify { file } => verify(&file, limits),
        Commands::Bench {
            iterations,
            entries,
            len,
        } => bench(iterations, entries, len, limits),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn write(out: &Path, list: &NdList) -> Result<()> {
    ndstash::save(out, list).with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), entries = list.len(), "wrote collection");
    println!("Wrote {} entries to {}", list.len(), out.display());
    Ok(())
}

fn inspect(file: &Path, limits: DecodeLimits) -> Result<()> {
    let mapped = MappedFile::open(file)
        .with_context(|| format!("failed to open {}", file.display()))?
        .with_limits(limits);

    let entries = mapped
        .entries()
        .with_context(|| format!("invalid header in {}", file.display()))?;
    let header = entries.header();

    println!("📦 {}", file.display());
    println!("   Version:  {}", header.version);
    println!("   Entries:  {}", header.entry_count);
    println!("   Size:     {} bytes", mapped.as_bytes().len());

    for (index, view) in entries.enumerate() {
        let view = view.with_context(|| format!("entry {index} is invalid"))?;
        let name = match view.name {
            Some(name) => format!("{name:?}"),
            None => "-".to_string(),
        };
        println!(
            "   [{index:>4}] {name:<24} {:<8} {:?} ({} bytes)",
            view.dtype,
            view.shape,
            view.data.len()
        );
    }
    Ok(())
}

fn verify(file: &Path, limits: DecodeLimits) -> Result<()> {
    let mapped = MappedFile::open(file)
        .with_context(|| format!("failed to open {}", file.display()))?
        .with_limits(limits);
    let list = mapped
        .decode()
        .with_context(|| format!("failed to decode {}", file.display()))?;

    let reencoded = protocol::encode(&list)?;
    if reencoded != mapped.as_bytes() {
        bail!(
            "{}: re-encoding produced {} bytes that differ from the {} on disk",
            file.display(),
            reencoded.len(),
            mapped.as_bytes().len()
        );
    }

    println!("✅ {}: {} entries, round-trip exact", file.display(), list.len());
    Ok(())
}

fn bench(iterations: usize, entries: usize, len: i32, limits: DecodeLimits) -> Result<()> {
    println!("📊 Codec Benchmark");
    println!("------------------");

    let list: NdList = (0..entries)
        .map(|i| (format!("array {i}"), NdArray::arange(len)))
        .collect();
    let iterations = iterations.max(1);

    let mut encoder = Encoder::new();

    // Fail before timing anything if the collection does not round-trip.
    let encoded = encoder.encode(&list)?.to_vec();
    protocol::decode_with_limits(&encoded, limits)?;

    // Warm up
    for _ in 0..100 {
        encoder.reset();
        black_box(encoder.encode(&list)?);
    }

    let start = Instant::now();
    for _ in 0..iterations {
        encoder.reset();
        black_box(encoder.encode(black_box(&list))?);
    }
    let encode_duration = start.elapsed();

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(Decoder::with_limits(black_box(&encoded), limits).decode_list()?);
    }
    let decode_duration = start.elapsed();

    let encode_ns = encode_duration.as_nanos() as f64 / iterations as f64;
    let decode_ns = decode_duration.as_nanos() as f64 / iterations as f64;

    println!("  Entries: {} × {} elements", entries, len);
    println!("  Encoded size: {} bytes", encoded.len());
    println!("  Operations: {}", iterations);
    println!(
        "  Encode latency: {:.2} ns/op ({:.3} μs/op)",
        encode_ns,
        encode_ns / 1000.0
    );
    println!(
        "  Decode latency: {:.2} ns/op ({:.3} μs/op)",
        decode_ns,
        decode_ns / 1000.0
    );
    println!(
        "  Encode throughput: {:.2} MB/sec",
        (iterations * encoded.len()) as f64 / encode_duration.as_secs_f64() / 1_000_000.0
    );
    println!(
        "  Decode throughput: {:.2} MB/sec",
        (iterations * encoded.len()) as f64 / decode_duration.as_secs_f64() / 1_000_000.0
    );
    Ok(())
}
