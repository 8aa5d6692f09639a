//! Synthetic dataset generation CLI.
//!
//! Generates UISketch synthetic dataset images from a directory of labeled
//! UI element sketches, then converts the accumulated annotations into
//! label CSVs with a train/test split.
//!
//! Usage:
//! ```
//! uisketch-datagen --directory <elements> --output <folder> --limit 100
//! ```
//!
//! Pass `--datagen-only` to skip the CSV conversion, or `--conversion-only`
//! to convert existing annotations without generating new images.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;

use uisketch_datagen::core::{DatagenResult, GeneratorConfig, init_tracing};
use uisketch_datagen::dataset::{LabelConverter, SyntheticDatagen};

/// Command-line arguments for the dataset generator.
#[derive(Parser)]
#[command(name = "uisketch-datagen")]
#[command(about = "Generate UISketch synthetic dataset from labelled UI element sketches")]
struct Args {
    /// Directory containing labelled folders of UI element sketches
    #[arg(short, long)]
    directory: PathBuf,

    /// Output folder for generated images, annotations, and label CSVs
    #[arg(short, long)]
    output: PathBuf,

    /// Number of dataset images to generate
    #[arg(short, long)]
    limit: usize,

    /// Per-task timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    /// Test split fraction for the label CSVs
    #[arg(short = 's', long, default_value_t = 0.2)]
    test_split: f64,

    /// Seed for reproducible generation and splitting
    #[arg(long)]
    seed: Option<u64>,

    /// Optional JSON file with generator configuration overrides
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Generate images and annotations without label CSVs
    #[arg(long, group = "mode")]
    datagen_only: bool,

    /// Convert existing annotations to label CSVs without generating
    #[arg(long, group = "mode")]
    conversion_only: bool,
}

fn main() -> DatagenResult<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_json_file(path)?,
        None => GeneratorConfig::new(),
    };
    if args.seed.is_some() {
        config = config.with_seed(args.seed);
    }
    let seed = config.seed;
    let datagen = SyntheticDatagen::new(&args.directory, &args.output, config)?;

    info!(
        directory = %args.directory.display(),
        output = %args.output.display(),
        "labels: {}",
        datagen.labels().join(", ")
    );

    if !args.conversion_only {
        let summary = datagen.generate(args.limit, Duration::from_secs(args.timeout))?;
        println!("{summary}");
    }

    if !args.datagen_only {
        let converter = LabelConverter::new(datagen.annotations_dir(), datagen.data_dir());
        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let summary = converter.convert(args.test_split, &mut rng)?;
        println!(
            "wrote {} label rows ({} train, {} test) across {} canvases",
            summary.rows, summary.train_rows, summary.test_rows, summary.canvases
        );
    }

    Ok(())
}
