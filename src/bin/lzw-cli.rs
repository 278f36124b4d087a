//! lzw-cli - command-line interface for lzwpack
//!
//! Pack and unpack files in the LZW container format, plus two self-test
//! modes: `test` round-trips a real file through temporary files, `large`
//! does the same with generated synthetic data. Both verify the result
//! with the built-in POSIX cksum.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use lzwpack::{cksum, pack_file, unpack_file, LzwError, MaxBits, Options};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "lzw-cli")]
#[command(about = "Variable-width LZW compression with periodic dictionary reset")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (sizes, ratios)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Per-segment diagnostic tracing
    #[arg(short, long, global = true)]
    diagnostic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    Pack {
        /// Input file to compress
        input: PathBuf,

        /// Output compressed file
        output: PathBuf,

        /// Maximum code width. The decoder handles 16-bit streams but this
        /// encoder tops out at 15
        #[arg(short, long, default_value_t = 15, value_parser = clap::value_parser!(u8).range(12..=16))]
        bits: u8,

        /// Keep a partial output file on failure
        #[arg(short, long)]
        keep_on_error: bool,
    },

    /// Decompress a file
    Unpack {
        /// Input compressed file
        input: PathBuf,

        /// Output decompressed file
        output: PathBuf,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,

        /// Keep a partial output file on failure
        #[arg(short, long)]
        keep_on_error: bool,
    },

    /// Round-trip a file through temporary files and compare checksums
    Test {
        /// File to round-trip
        input: PathBuf,

        /// Maximum code width for the compression leg
        #[arg(short, long, default_value_t = 15, value_parser = clap::value_parser!(u8).range(12..=16))]
        bits: u8,
    },

    /// Round-trip generated synthetic data (N blocks of 256 KiB)
    Large {
        /// Size in 256 KiB units
        #[arg(default_value_t = 32)]
        blocks: u32,

        /// Maximum code width for the compression leg
        #[arg(short, long, default_value_t = 15, value_parser = clap::value_parser!(u8).range(12..=16))]
        bits: u8,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.diagnostic {
        LevelFilter::Trace
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);

    let opts = Options {
        verbose: cli.verbose,
        diagnostic: cli.diagnostic,
        ..Options::default()
    };

    let result = match cli.command {
        Commands::Pack {
            input,
            output,
            bits,
            keep_on_error,
        } => run_pack(&input, &output, Options { keep_on_error, ..opts }, bits),
        Commands::Unpack {
            input,
            output,
            force,
            keep_on_error,
        } => run_unpack(
            &input,
            &output,
            Options {
                overwrite: force,
                keep_on_error,
                ..opts
            },
        ),
        Commands::Test { input, bits } => run_test(&input, opts, bits),
        Commands::Large { blocks, bits } => run_large(blocks, opts, bits),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn progress_for(len: u64) -> Option<ProgressBar> {
    if len <= 1024 * 1024 {
        return None;
    }
    let pb = ProgressBar::new(2);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .ok()?;
    pb.set_style(style.progress_chars("#>-"));
    Some(pb)
}

fn run_pack(input: &Path, output: &Path, opts: Options, bits: u8) -> Result<(), LzwError> {
    let max_bits = MaxBits::for_pack(bits)?;
    let input_len = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);

    let progress = progress_for(input_len);
    if let Some(pb) = &progress {
        pb.set_message("packing...");
        pb.inc(1);
    }

    let start = Instant::now();
    let stats = pack_file(input, output, opts, max_bits)?;

    if let Some(pb) = &progress {
        pb.inc(1);
        pb.finish_with_message("done");
    }

    println!("Compression successful.");
    println!(
        "  {} -> {} bytes ({:.2}%) in {:.2?}",
        stats.input_bytes,
        stats.output_bytes,
        stats.ratio(),
        start.elapsed()
    );
    Ok(())
}

fn run_unpack(input: &Path, output: &Path, opts: Options) -> Result<(), LzwError> {
    let input_len = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);

    let progress = progress_for(input_len);
    if let Some(pb) = &progress {
        pb.set_message("unpacking...");
        pb.inc(1);
    }

    let start = Instant::now();
    let stats = unpack_file(input, output, opts)?;

    if let Some(pb) = &progress {
        pb.inc(1);
        pb.finish_with_message("done");
    }

    println!("Decompression successful.");
    println!(
        "  {} -> {} bytes in {:.2?}",
        stats.input_bytes,
        stats.output_bytes,
        start.elapsed()
    );
    Ok(())
}

fn checksum_line(path: &Path) -> Result<u32, LzwError> {
    let data = std::fs::read(path).map_err(|e| LzwError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let crc = cksum(&data);
    println!("{} {} {}", crc, data.len(), path.display());
    Ok(crc)
}

/// Pack into a tempdir, unpack back out, compare checksums of the original
/// and the round-tripped copy.
fn round_trip(input: &Path, opts: Options, bits: u8) -> Result<(), LzwError> {
    let max_bits = MaxBits::for_pack(bits)?;
    let dir = tempfile::tempdir().map_err(|e| LzwError::Open {
        path: PathBuf::from("<tempdir>"),
        source: e,
    })?;
    let packed = dir.path().join("packed.lzw");
    let restored = dir.path().join("restored.bin");

    pack_file(input, &packed, opts, max_bits)?;
    println!("Compression successful.");

    unpack_file(
        &packed,
        &restored,
        Options {
            overwrite: true,
            ..opts
        },
    )?;
    println!("Decompression successful.");

    let before = checksum_line(input)?;
    let after = checksum_line(&restored)?;
    if before != after {
        eprintln!("Checksum mismatch!");
        std::process::exit(1);
    }
    println!("Checksums match.");
    Ok(())
}

fn run_test(input: &Path, opts: Options, bits: u8) -> Result<(), LzwError> {
    round_trip(input, opts, bits)
}

fn run_large(blocks: u32, opts: Options, bits: u8) -> Result<(), LzwError> {
    let dir = tempfile::tempdir().map_err(|e| LzwError::Open {
        path: PathBuf::from("<tempdir>"),
        source: e,
    })?;
    let synth = dir.path().join("synth.bin");

    // N x 256 KiB of a constant filler byte, written in 1 KiB blocks.
    let block = [0x0Au8; 1024];
    let file = std::fs::File::create(&synth).map_err(|e| LzwError::Open {
        path: synth.clone(),
        source: e,
    })?;
    let mut writer = std::io::BufWriter::new(file);
    for _ in 0..256u64 * u64::from(blocks) {
        std::io::Write::write_all(&mut writer, &block).map_err(LzwError::Write)?;
    }
    std::io::Write::flush(&mut writer).map_err(LzwError::Write)?;

    println!("Generated {} KiB of synthetic data.", 256 * blocks);
    round_trip(&synth, opts, bits)
}
