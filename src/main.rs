#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glif_nodes::config::Config;
use glif_nodes::models::{
    ArtifactReference, HubEmbeddingLoader, HubReference, SafetensorsPayload, SourceResolver,
};
use glif_nodes::nodes::NodeKind;
use glif_nodes::pixels::{
    pad_to, sdxl_dimensions, to_multiple_of, FilmGrain, GrainMode, ImageBatch, MultipleOfMethod,
    PadMethod,
};
use glif_nodes::values::{resolve_variable, FloatRamp, RampType};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glif-nodes")]
#[command(about = "Model fetching and image post-processing nodes", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/glif-nodes/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a Hugging Face, CivitAI or plain URL to a cached local file
    Resolve {
        url: String,
        /// Print the cache path without downloading
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch a file from a Hugging Face Hub repo
    HubDownload {
        repo_id: String,
        filename: String,
        #[arg(long)]
        subfolder: Option<String>,
        /// Place the file in the embeddings directory
        #[arg(long)]
        embedding: bool,
    },
    /// List tensors and metadata of a safetensors file
    Inspect { path: PathBuf },
    /// Print the SDXL resolution closest to an image's aspect ratio
    AspectRatio { image: PathBuf },
    /// Apply a film grain effect
    FilmGrain {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 0.1)]
        intensity: f32,
        #[arg(long, default_value_t = 1.0)]
        grain_size: f32,
        #[arg(long, default_value_t = 0.0)]
        grain_saturation: f32,
        #[arg(long, default_value_t = 0.5)]
        brightness_impact: f32,
        #[arg(long, default_value_t = 1.0)]
        image_saturation: f32,
        /// "Color" or "Black and White"
        #[arg(long, default_value = "Color")]
        mode: GrainMode,
        /// Noise seed; random when omitted
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Pad an image up to a target size
    Pad {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        width: usize,
        #[arg(long)]
        height: usize,
        /// constant, replicate or reflect
        #[arg(long, default_value = "constant")]
        method: PadMethod,
    },
    /// Shrink an image so both sides are a multiple of N
    MultipleOf {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 64)]
        multiple_of: usize,
        /// "center crop" or "rescale"
        #[arg(long, default_value = "center crop")]
        method: MultipleOfMethod,
    },
    /// Evaluate a workflow variable with fallback
    Variable {
        variable: String,
        #[arg(long, default_value = "")]
        fallback: String,
    },
    /// Print ramp values per sampling step
    Ramp {
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        #[arg(long, default_value_t = 1.0)]
        end: f64,
        #[arg(long, default_value_t = 20)]
        steps_threshold: u32,
        #[arg(long, default_value = "linear")]
        ramp_type: RampType,
        /// Single step to evaluate; every step up to the threshold when omitted
        #[arg(long)]
        step: Option<u32>,
    },
    /// List the registered nodes
    Nodes,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { url, dry_run } => {
            let resolver = build_resolver(cli.config.as_deref())?;
            if dry_run {
                let reference = ArtifactReference::parse(&url)?;
                match resolver.cache_path_for(&reference) {
                    Some(path) => println!("{}", path.display()),
                    None => println!("(managed by the Hugging Face cache)"),
                }
            } else {
                let path = resolver
                    .resolve(&url)
                    .with_context(|| format!("Failed to resolve {url}"))?;
                println!("{}", path.display());
            }
        }
        Commands::HubDownload {
            repo_id,
            filename,
            subfolder,
            embedding,
        } => {
            let resolver = build_resolver(cli.config.as_deref())?;
            let path = if embedding {
                HubEmbeddingLoader::new(Arc::new(resolver)).download_embedding(
                    &repo_id,
                    subfolder.as_deref(),
                    &filename,
                )
            } else {
                let reference = HubReference::new(&repo_id, subfolder.as_deref(), &filename)?;
                resolver.resolve_hub(&reference)
            }
            .with_context(|| format!("Failed to download {filename} from {repo_id}"))?;
            println!("{}", path.display());
        }
        Commands::Inspect { path } => inspect(&path)?,
        Commands::AspectRatio { image } => {
            let batch = read_image(&image)?;
            let (width, height) = sdxl_dimensions(&batch);
            println!("{width} {height}");
        }
        Commands::FilmGrain {
            input,
            output,
            intensity,
            grain_size,
            grain_saturation,
            brightness_impact,
            image_saturation,
            mode,
            seed,
        } => {
            let grain = FilmGrain {
                intensity,
                grain_size,
                grain_saturation,
                brightness_impact,
                image_saturation,
                mode,
            };
            let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            let batch = read_image(&input)?;
            let result = grain.apply(&batch, &mut rng)?;
            write_image(&result, &output)?;
        }
        Commands::Pad {
            input,
            output,
            width,
            height,
            method,
        } => {
            let batch = read_image(&input)?;
            write_image(&pad_to(&batch, width, height, method), &output)?;
        }
        Commands::MultipleOf {
            input,
            output,
            multiple_of,
            method,
        } => {
            let batch = read_image(&input)?;
            write_image(&to_multiple_of(&batch, multiple_of, method)?, &output)?;
        }
        Commands::Variable { variable, fallback } => {
            let value = resolve_variable(&variable, &fallback);
            println!("string: {}", value.string);
            println!("int:    {}", value.int);
            println!("float:  {}", value.float);
        }
        Commands::Ramp {
            start,
            end,
            steps_threshold,
            ramp_type,
            step,
        } => {
            let ramp = FloatRamp {
                start,
                end,
                steps_threshold,
                ramp_type,
            };
            match step {
                Some(step) => println!("{}", ramp.value_at(step)),
                None => {
                    for step in 0..=steps_threshold {
                        println!("{step:>4}  {:.6}", ramp.value_at(step));
                    }
                }
            }
        }
        Commands::Nodes => {
            for kind in NodeKind::ALL {
                println!(
                    "{:<22} {:<30} {}",
                    kind.class_name(),
                    kind.display_name(),
                    kind.category().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

fn build_resolver(config_path: Option<&Path>) -> Result<SourceResolver> {
    let config = match config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;

    Ok(SourceResolver::from_config(&config)?)
}

fn inspect(path: &Path) -> Result<()> {
    let payload = SafetensorsPayload::read(path)?;

    println!("{} ({} tensors)", path.display(), payload.len());
    for (key, value) in payload.metadata() {
        println!("  meta {key} = {value}");
    }
    for (name, info) in payload.tensors() {
        println!("  {name}: {} {:?}", info.dtype, info.shape);
    }
    Ok(())
}

fn read_image(path: &Path) -> Result<ImageBatch> {
    let image = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(ImageBatch::from_image(&image))
}

fn write_image(batch: &ImageBatch, path: &Path) -> Result<()> {
    // 8-bit output so every common format can encode it
    let image = batch.to_image(0)?.to_rgb8();
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}
