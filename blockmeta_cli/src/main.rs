use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use blockmeta_codecs::codec_by_name;
use blockmeta_core::layout::{
    aligned_len, aligned_nbyte, csr_nbyte, nnz_percentage, npart, Align, DEFAULT_DENSITY,
};
use blockmeta_core::stage::{self, OUTLIER_CODE};
use blockmeta_core::{datasets, parse_extents, DimCode, ErrorMode, JobConfig, Metadata, ShapeSource};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "blockmeta",
    about = "Configure block geometry, error bounds, and quantization for block-wise lossy compression jobs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the job metadata and print every derived field
    Configure {
        #[command(flatten)]
        job: JobArgs,
        /// Print the record as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the built-in demo dataset shapes
    Datasets,
    /// Run the reference entropy stage on quant codes and report the counters
    Encode {
        #[command(flatten)]
        job: JobArgs,
        /// Raw little-endian u16 quant codes; synthesized when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Write the encoded stream here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Codec to use: passthrough | zstd | lz4 | deflate
        #[arg(short, long, default_value = "zstd")]
        codec: String,
        /// Compression level for zstd (1–22) or deflate (0–9)
        #[arg(long)]
        level: Option<i32>,
        /// Seed for synthesized codes
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Args)]
struct JobArgs {
    /// JSON job description; other job flags are ignored when set
    #[arg(long)]
    config: Option<PathBuf>,
    /// Extents, e.g. 3600x1800 or 512,512,512
    #[arg(short, long, conflicts_with = "dataset")]
    dims: Option<String>,
    /// Dimensionality code: 1, 2, 3, 257 (0x101) or 513 (0x201)
    #[arg(short, long, default_value_t = 1)]
    ndim: u32,
    /// Use the shape of a demo dataset instead of --dims
    #[arg(long)]
    dataset: Option<String>,
    /// Error bound (absolute, or a fraction of the range in r2r mode)
    #[arg(short, long, default_value_t = 1e-4)]
    eb: f64,
    /// Error mode: abs | r2r
    #[arg(short, long, default_value = "abs")]
    mode: String,
    /// Value range of the data (required in r2r mode)
    #[arg(short, long)]
    range: Option<f64>,
    /// Number of quantization bins
    #[arg(short, long, default_value_t = 1024)]
    bins: i64,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn job_config(args: &JobArgs) -> anyhow::Result<JobConfig> {
    if let Some(path) = &args.config {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading job config {:?}", path))?;
        return JobConfig::from_json(&json).with_context(|| format!("parsing {:?}", path));
    }

    let mut cfg = match (&args.dims, &args.dataset) {
        (Some(dims), None) => {
            let extents = parse_extents(dims)?;
            let ndim = DimCode::try_from(args.ndim)?;
            JobConfig::with_extents(extents, ndim, args.eb)
        }
        (None, Some(name)) => JobConfig::with_dataset(name.clone(), args.eb),
        _ => anyhow::bail!("one of --dims or --dataset is required"),
    };
    cfg.mode = args.mode.parse()?;
    cfg.range = args.range;
    cfg.bins = args.bins;
    Ok(cfg)
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn gib_per_sec(nbyte: u64, seconds: f64) -> f64 {
    nbyte as f64 / (1024.0 * 1024.0 * 1024.0) / seconds.max(1e-9)
}

/// Deterministic codes clustered around `radius`; about 1% are outliers.
fn synthesize_codes(len: u64, radius: u32, seed: u64) -> Vec<u16> {
    // keeps every code below cap = 2 * radius
    let spread = (radius / 8) as u64;
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            if (rng >> 33) % 100 == 0 {
                return OUTLIER_CODE;
            }
            let offset = (rng >> 40) % (2 * spread + 1);
            (radius as u64 + offset - spread) as u16
        })
        .collect()
}

fn read_codes(path: &Path) -> anyhow::Result<Vec<u16>> {
    let bytes = fs::read(path).with_context(|| format!("reading quant codes {:?}", path))?;
    if bytes.len() % 2 != 0 {
        anyhow::bail!("{:?} holds {} bytes, not a whole number of u16 codes", path, bytes.len());
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn print_metadata(meta: &Metadata) {
    let ndim = meta
        .ndim()
        .map_or("-".to_string(), |d| format!("{} ({:#x})", d, d.code()));
    println!("  ndim           : {}", ndim);
    println!("  block          : {}", meta.block());
    println!(
        "  extents        : {} x {} x {} x {}",
        meta.d0(),
        meta.d1(),
        meta.d2(),
        meta.d3()
    );
    println!(
        "  strides        : {}, {}, {}, {}",
        meta.stride0(),
        meta.stride1(),
        meta.stride2(),
        meta.stride3()
    );
    println!(
        "  blocks         : {} x {} x {}  (nb3 = {})",
        meta.nb0(),
        meta.nb1(),
        meta.nb2(),
        meta.nb3()
    );
    println!("  len            : {}", meta.len());
    println!("  cap / radius   : {} / {}", meta.cap(), meta.radius());
    println!("  eb             : {:e}", meta.eb());
    println!("  ebx2           : {:e}", meta.ebx2());
    println!("  eb_r / ebx2_r  : {:e} / {:e}", meta.eb_r(), meta.ebx2_r());
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_configure(job: JobArgs, json: bool) -> anyhow::Result<()> {
    let cfg = job_config(&job)?;
    let meta = cfg.build()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    if let ShapeSource::Dataset(name) = &cfg.shape {
        eprintln!("  dataset        : {}", name);
    }
    if cfg.mode == ErrorMode::R2r {
        eprintln!(
            "  r2r            : {:e} x range {:e}",
            cfg.eb,
            cfg.range.unwrap_or_default()
        );
    }
    eprintln!(
        "  pipeline       : {} / {} / {}",
        cfg.predictor, cfg.spreducer, cfg.dtype
    );
    print_metadata(&meta);
    println!(
        "  device buffer  : {} (square view {})",
        human_bytes(aligned_nbyte::<f32>(meta.len() as usize) as u64),
        aligned_len(meta.len(), Align::SquareMatrix)
    );
    let expected_nnz = (meta.len() as f64 * DEFAULT_DENSITY) as u64;
    println!(
        "  outlier budget : {} ({} at {:.0}% density)",
        human_bytes(csr_nbyte::<f32, u32>(meta.len(), expected_nnz)),
        cfg.spreducer,
        DEFAULT_DENSITY * 100.0
    );
    Ok(())
}

fn run_datasets() -> anyhow::Result<()> {
    println!(
        "  {:<10}  {:>22}  {:>10}  {:>6}  {:>12}  {:>10}",
        "name", "extents", "layout", "block", "blocks", "raw f32"
    );
    println!("  {}", "-".repeat(80));
    for demo in datasets::all() {
        let mut meta = Metadata::new();
        meta.set_demo_dimensions(demo.name)?;
        let geometry = meta
            .geometry()
            .ok_or_else(|| anyhow::anyhow!("{} has no geometry", demo.name))?;
        let shown: Vec<String> = demo.extents[..demo.ndim.spatial_axes()]
            .iter()
            .map(|e| e.to_string())
            .collect();
        println!(
            "  {:<10}  {:>22}  {:>10}  {:>6}  {:>12}  {:>10}",
            demo.name,
            shown.join("x"),
            demo.ndim.to_string(),
            geometry.block(),
            geometry.total_blocks(),
            human_bytes(geometry.len() * 4)
        );
    }
    Ok(())
}

fn run_encode(
    job: JobArgs,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    codec_name: &str,
    level: Option<i32>,
    seed: u64,
) -> anyhow::Result<()> {
    let mut meta = job_config(&job)?.build()?;
    let codec = codec_by_name(codec_name, level)?;

    let codes = match &input {
        Some(path) => read_codes(path)?,
        None => {
            eprintln!("  synthesizing {} codes (seed {})", meta.len(), seed);
            synthesize_codes(meta.len(), meta.radius(), seed)
        }
    };

    let t0 = Instant::now();
    let stream = stage::run(&mut meta, &codes, codec.as_ref())?;
    let elapsed = t0.elapsed();

    if let Some(path) = &output {
        fs::write(path, &stream).with_context(|| format!("writing stream {:?}", path))?;
        eprintln!("  written to {:?}", path);
    }

    let raw_bytes = codes.len() as u64 * 2;
    let payload_bytes = npart(meta.total_bits(), 8);
    eprintln!("  codec       : {}", codec.name());
    eprintln!("  codes       : {}", codes.len());
    eprintln!("  raw codes   : {}", human_bytes(raw_bytes));
    eprintln!("  encoded     : {}", human_bytes(stream.len() as u64));
    eprintln!(
        "  ratio       : {:.2}x",
        raw_bytes as f64 / payload_bytes.max(1) as f64
    );
    eprintln!(
        "  throughput  : {:.3} GiB/s",
        gib_per_sec(raw_bytes, elapsed.as_secs_f64())
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());

    println!("  nnz                : {} {}", meta.nnz(), nnz_percentage(meta.nnz(), meta.len()));
    println!("  total_bits         : {}", meta.total_bits());
    println!("  total_uint         : {}", meta.total_uint());
    println!("  huff_metadata_size : {}", meta.huff_metadata_size());
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Configure { job, json } => run_configure(job, json),
        Commands::Datasets => run_datasets(),
        Commands::Encode {
            job,
            input,
            output,
            codec,
            level,
            seed,
        } => run_encode(job, input, output, &codec, level, seed),
    }
}
