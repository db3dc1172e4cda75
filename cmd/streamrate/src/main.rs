//! streamrate - resample raw interleaved PCM from a file or stdin.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use streamrate::{Encoding, Library, Sample};
use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod job;

use job::{Job, Resolved};

/// streamrate - streaming PCM sample rate converter.
///
/// Reads raw interleaved little-endian PCM, converts it to another sample
/// rate and writes raw PCM of the same encoding and channel layout.
///
/// Example:
///   streamrate --channels 2 --input-rate 48000 --output-rate 16000 -i in.pcm -o out.pcm
#[derive(Parser, Debug)]
#[command(name = "streamrate")]
#[command(about = "Streaming PCM sample rate converter")]
#[command(version)]
pub struct Cli {
    /// Job file (YAML); flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of interleaved channels
    #[arg(long)]
    pub channels: Option<usize>,

    /// Input sample rate in Hz
    #[arg(long)]
    pub input_rate: Option<u32>,

    /// Output sample rate in Hz
    #[arg(long)]
    pub output_rate: Option<u32>,

    /// Quality from 1 (fastest) to 10 (best), default 7
    #[arg(short = 'q', long)]
    pub quality: Option<u8>,

    /// Sample encoding: f32le or s16le (default f32le)
    #[arg(short = 'e', long)]
    pub encoding: Option<Encoding>,

    /// Bytes read per chunk (default 4096)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Input file (default: stdin)
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Debug, Default)]
struct Totals {
    chunks: usize,
    bytes_in: usize,
    bytes_out: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging. Stdout may carry audio, so logs go to stderr.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let job = match &cli.config {
        Some(path) => Job::load(path)?,
        None => Job::default(),
    };
    let resolved = job.merge(&cli).resolve()?;
    debug!(?resolved, "job resolved");

    let lib = Library::new();
    lib.ready().await.context("failed to load resampler")?;

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };
    let writer: Box<dyn AsyncWrite + Unpin + Send> = match &cli.output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let totals = match resolved.encoding {
        Encoding::F32le => run::<f32>(&lib, &resolved, reader, writer).await?,
        Encoding::S16le => run::<i16>(&lib, &resolved, reader, writer).await?,
    };

    let frame = resolved.config.frame_bytes(resolved.encoding.width());
    info!(
        chunks = totals.chunks,
        frames_in = totals.bytes_in / frame,
        frames_out = totals.bytes_out / frame,
        "done"
    );
    Ok(())
}

async fn run<S: Sample>(
    lib: &Library,
    job: &Resolved,
    mut reader: Box<dyn AsyncRead + Unpin + Send>,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
) -> anyhow::Result<Totals> {
    let mut stream = lib.stream::<S>(job.config)?;
    let mut writer = BufWriter::new(writer);
    let mut buf = vec![0u8; job.chunk_size];
    let mut totals = Totals::default();

    loop {
        let n = reader.read(&mut buf).await.context("read failed")?;
        if n == 0 {
            break;
        }
        let out = stream
            .push(&buf[..n])
            .with_context(|| format!("resample failed at input byte {}", totals.bytes_in))?;
        writer.write_all(&out).await.context("write failed")?;
        totals.chunks += 1;
        totals.bytes_in += n;
        totals.bytes_out += out.len();
    }

    let tail = stream.flush().context("flush failed")?;
    writer.write_all(&tail).await.context("write failed")?;
    writer.flush().await.context("write failed")?;
    totals.bytes_out += tail.len();
    stream.close();

    Ok(totals)
}
