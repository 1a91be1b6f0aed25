// Clippy allows
#![allow(clippy::too_many_arguments)]

//! gtcore: a genome annotation toolkit
//!
//! Usage: gtcore <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;

use gtcore::bitvector::RrrBitvector;
use gtcore::error::{BitvectorError, StreamError};
use gtcore::stream::gff3_in::Gff3InStream;
use gtcore::stream::gff3_out::Gff3OutStream;
use gtcore::stream::sort::SortStream;
use gtcore::stream::sorted_variants::{LineSortedStream, NumSortedStream};
use gtcore::stream::NodeStream;

#[derive(Parser)]
#[command(name = "gtcore")]
#[command(version)]
#[command(about = "gtcore: genome annotation node-stream toolkit", long_about = None)]
struct Cli {
    /// Tolerate malformed records instead of aborting on the first one
    #[arg(long, global = true)]
    tidy: bool,

    /// Keep original feature IDs on output instead of uniquifying them
    #[arg(long, global = true)]
    retain_ids: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read GFF3 (and optionally GTF/BED), run it through the node-stream
    /// pipeline, and write GFF3 to stdout.
    Gff3 {
        /// Input files (use - or omit for stdin)
        inputs: Vec<PathBuf>,

        /// Reorder output before writing
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
    },

    /// Build and query a compressed bitvector from a file of `0`/`1`
    /// characters.
    Bitvector {
        #[command(subcommand)]
        action: BitvectorAction,
    },
}

/// Output ordering for the `gff3` command.
#[derive(Clone, Copy, ValueEnum)]
enum SortOrder {
    /// Ascending by (seqid, start, end), the node-stream default order.
    Seqid,
    /// Ascending by numeric interpretation of seqid, named seqids last.
    Numeric,
    /// Restore original file order (filename, then line number).
    Line,
}

#[derive(Subcommand)]
enum BitvectorAction {
    /// Build a compressed bitvector from a plain-text bitstring file and
    /// write it to `output`.
    Build {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value_t = gtcore::bitvector::DEFAULT_BLOCK_SIZE)]
        block_size: u32,

        #[arg(long, default_value_t = gtcore::bitvector::DEFAULT_SUPERBLOCK_SIZE)]
        superblock_size: u32,
    },

    /// Return the bit at `position`.
    Access { file: PathBuf, position: u64 },

    /// Return the count of `1` bits in `[0, position]`.
    Rank { file: PathBuf, position: u64 },

    /// Return the position of the `n`-th (1-indexed) `1` bit.
    Select { file: PathBuf, n: u64 },
}

fn open_inputs(paths: &[PathBuf]) -> io::Result<Vec<(String, Box<dyn BufRead>)>> {
    if paths.is_empty() {
        return Ok(vec![("<stdin>".to_string(), Box::new(BufReader::new(io::stdin())))]);
    }
    paths
        .iter()
        .map(|p| -> io::Result<(String, Box<dyn BufRead>)> {
            if p.as_os_str() == "-" {
                Ok(("<stdin>".to_string(), Box::new(BufReader::new(io::stdin()))))
            } else {
                let label = p.display().to_string();
                Ok((label, Box::new(BufReader::new(File::open(p)?))))
            }
        })
        .collect()
}

fn run_gff3(inputs: Vec<PathBuf>, sort: Option<SortOrder>) -> Result<(), StreamError> {
    let readers = open_inputs(&inputs)?;
    let stdout = io::stdout();

    let mut total = 0usize;
    for (label, reader) in readers {
        let input = Gff3InStream::new(reader, label);
        let stream: Box<dyn NodeStream> = match sort {
            None => Box::new(input),
            Some(SortOrder::Seqid) => Box::new(SortStream::new(input)),
            Some(SortOrder::Numeric) => Box::new(NumSortedStream::new(input)),
            Some(SortOrder::Line) => Box::new(LineSortedStream::new(input)),
        };
        let mut out = Gff3OutStream::new(stream, stdout.lock());
        total += out.run()?;
    }
    log::info!("wrote {} nodes", total);
    Ok(())
}

fn read_bitstring(path: &PathBuf) -> io::Result<Vec<bool>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .chars()
        .filter(|c| *c == '0' || *c == '1')
        .map(|c| c == '1')
        .collect())
}

fn run_bitvector(action: BitvectorAction) -> Result<(), BitvectorError> {
    match action {
        BitvectorAction::Build {
            input,
            output,
            block_size,
            superblock_size,
        } => {
            let bits = read_bitstring(&input)?;
            let bv = RrrBitvector::from_bits_with_params(&bits, block_size, superblock_size)?;
            bv.write_to_file(&output)?;
            log::info!("wrote {} bytes for {} bits", bv.file_size(), bv.len());
            Ok(())
        }
        BitvectorAction::Access { file, position } => {
            let bv = RrrBitvector::open_mmap(&file)?;
            println!("{}", if bv.access(position)? { 1 } else { 0 });
            Ok(())
        }
        BitvectorAction::Rank { file, position } => {
            let bv = RrrBitvector::open_mmap(&file)?;
            println!("{}", bv.rank1(position)?);
            Ok(())
        }
        BitvectorAction::Select { file, n } => {
            let bv = RrrBitvector::open_mmap(&file)?;
            println!("{}", bv.select1(n)?);
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    gtcore::config::set_strict_mode(!cli.tidy);
    gtcore::config::set_retain_ids(cli.retain_ids);

    let result: Result<(), String> = match cli.command {
        Commands::Gff3 { inputs, sort } => run_gff3(inputs, sort).map_err(|e| e.to_string()),
        Commands::Bitvector { action } => run_bitvector(action).map_err(|e| e.to_string()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
