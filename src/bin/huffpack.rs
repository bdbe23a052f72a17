use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use huffpack::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_HEADER_LEN};
use huffpack::{paths, CodecConfig, HuffmanCodec, Stage};

/// Huffman file compressor.
#[derive(Parser, Debug)]
#[command(author, version, about = "Compress and decompress files with Huffman coding", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress SOURCE into <name>.huff
    Encode(Job),
    /// Restore a .huff file
    Decode(Job),
}

#[derive(Args, Debug)]
struct Job {
    /// File to read
    source: PathBuf,

    /// Directory for the output file (defaults to the source's directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Bytes read per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Largest header accepted when decoding
    #[arg(long, default_value_t = DEFAULT_MAX_HEADER_LEN)]
    max_header_len: usize,
}

impl Job {
    fn codec(&self) -> Result<HuffmanCodec> {
        let config = CodecConfig::default()
            .with_chunk_size(self.chunk_size)
            .with_max_header_len(self.max_header_len);
        Ok(HuffmanCodec::with_config(config)?)
    }

    fn target_dir(&self) -> PathBuf {
        match &self.out_dir {
            Some(dir) => dir.clone(),
            None => self
                .source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Logs progress at most once per tenth of the source.
struct ProgressLog {
    total: u64,
    next_tenth: [u64; 3],
}

impl ProgressLog {
    fn new(total: u64) -> Self {
        ProgressLog { total, next_tenth: [1; 3] }
    }

    fn report(&mut self, stage: Stage, processed: u64) {
        if self.total == 0 {
            return;
        }
        let slot = match stage {
            Stage::Scan => 0,
            Stage::Pack => 1,
            Stage::Unpack => 2,
        };
        let tenths = processed.saturating_mul(10) / self.total;
        if tenths >= self.next_tenth[slot] {
            self.next_tenth[slot] = tenths + 1;
            info!(?stage, processed, total = self.total, "{}%", tenths.min(10) * 10);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HUFFPACK_LOG")
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_default();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn encode(job: &Job) -> Result<()> {
    let codec = job.codec()?;
    paths::validate_source(&job.source)?;
    let dir = job.target_dir();
    paths::prepare_target_dir(&dir)
        .with_context(|| format!("preparing output directory {}", dir.display()))?;

    let target = paths::non_colliding_path(&paths::encoded_path(&job.source, &dir));
    let total = std::fs::metadata(&job.source)?.len();
    let mut log = ProgressLog::new(total);

    info!(source = %job.source.display(), target = %target.display(), "encoding");
    let summary = codec
        .encode_file_with_progress(&job.source, &target, &mut |stage: Stage, n: u64| {
            log.report(stage, n)
        })
        .with_context(|| format!("encoding {}", job.source.display()))?;

    println!(
        "{} -> {}: {} bytes -> {} bytes ({:.1}%)",
        job.source.display(),
        target.display(),
        summary.original_length,
        summary.encoded_len(),
        summary.ratio() * 100.0
    );
    Ok(())
}

fn decode(job: &Job) -> Result<()> {
    let codec = job.codec()?;
    paths::validate_source(&job.source)?;
    let dir = job.target_dir();
    paths::prepare_target_dir(&dir)
        .with_context(|| format!("preparing output directory {}", dir.display()))?;

    let target = paths::non_colliding_path(&paths::decoded_path(&job.source, &dir));
    // unpack progress counts header bytes as well, so the whole file is the total
    let total = std::fs::metadata(&job.source)?.len();
    let mut log = ProgressLog::new(total);

    info!(source = %job.source.display(), target = %target.display(), "decoding");
    let summary = codec
        .decode_file_with_progress(&job.source, &target, &mut |stage: Stage, n: u64| {
            log.report(stage, n)
        })
        .with_context(|| format!("decoding {}", job.source.display()))?;

    println!(
        "{} -> {}: {} bytes restored",
        job.source.display(),
        target.display(),
        summary.original_length
    );
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match &cli.command {
        Command::Encode(job) => encode(job),
        Command::Decode(job) => decode(job),
    }
}
