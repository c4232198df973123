//! `deslant` command line tool.
//!
//! Deslants every input image (files, or directories of png/jpg/jpeg/bmp
//! images) and writes the upright images next to the inputs or into
//! `--out-dir`.

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::{Parser, ValueEnum};
use deslant::{
    build_engine, convert, deslant_with, Backend, DeslantConfig, DeslantError, DeslantIoError,
    DeslantReport, ImageReport, Optimizer, ShearBounds,
};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OptimizerArg {
    Grid,
    Powell,
}

impl From<OptimizerArg> for Optimizer {
    fn from(arg: OptimizerArg) -> Self {
        match arg {
            OptimizerArg::Grid => Optimizer::Grid,
            OptimizerArg::Powell => Optimizer::Powell,
        }
    }
}

/// Remove the slant of handwritten or printed text lines.
#[derive(Parser, Debug)]
#[command(name = "deslant", version, about, long_about = None)]
struct Cli {
    /// Input images or directories containing them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for the deslanted images (default: next to each input)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// JSON config; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lower bound of the shear search interval
    #[arg(long, allow_hyphen_values = true)]
    lower_bound: Option<f32>,

    /// Upper bound of the shear search interval
    #[arg(long, allow_hyphen_values = true)]
    upper_bound: Option<f32>,

    /// Number of grid points of the grid optimizer
    #[arg(long)]
    num_steps: Option<usize>,

    /// Search strategy
    #[arg(long, value_enum)]
    optimizer: Option<OptimizerArg>,

    /// Gray value filling the canvas exposed by the shear
    #[arg(long)]
    bg_color: Option<u8>,

    /// Engine running the search
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Write a JSON report with every evaluated shear to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), DeslantIoError> {
    let config = resolve_config(cli)?;
    let mut engine = build_engine(&config)?;
    let mut report = DeslantReport::new(engine.name(), config.clone());

    let files = collect_inputs(&cli.inputs)?;
    if files.is_empty() {
        log::warn!("no images found in the given inputs");
    }
    if let Some(dir) = &cli.out_dir {
        fs::create_dir_all(dir)?;
    }

    for path in files {
        println!("Processing {}", path.display());
        let img = convert::into_luma(::image::open(&path)?);
        let view = convert::luma_view(&img).map_err(DeslantError::from)?;

        let started = Instant::now();
        let result = deslant_with(&mut engine, &view, config.bg_color)?;
        let runtime_ms = started.elapsed().as_secs_f64() * 1000.0;
        println!(
            "Runtime {runtime_ms:.1}ms, shear value {:.3}",
            result.alpha()
        );

        let out_path = output_path(&path, cli.out_dir.as_deref());
        let mut entry = ImageReport::new(path.display().to_string(), &result, runtime_ms);
        let out = convert::to_image(result.image).map_err(DeslantError::from)?;
        out.save(&out_path)?;
        entry.output = Some(out_path.display().to_string());
        report.images.push(entry);
    }

    if let Some(path) = &cli.report {
        report.write_json(path)?;
        println!("wrote report to {}", path.display());
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<DeslantConfig, DeslantIoError> {
    let mut config = match &cli.config {
        Some(path) => DeslantConfig::load_json(path)?,
        None => DeslantConfig::default(),
    };
    if cli.lower_bound.is_some() || cli.upper_bound.is_some() {
        let lower = cli.lower_bound.unwrap_or(config.search.bounds.lower);
        let upper = cli.upper_bound.unwrap_or(config.search.bounds.upper);
        config.search.bounds = ShearBounds::new(lower, upper).map_err(DeslantError::from)?;
    }
    if let Some(steps) = cli.num_steps {
        config.search.steps = steps;
    }
    if let Some(optimizer) = cli.optimizer {
        config.search.optimizer = optimizer.into();
    }
    if let Some(bg) = cli.bg_color {
        config.bg_color = bg;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    Ok(config)
}

/// Expand directories into their image files, sorted by name.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, DeslantIoError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            found.sort();
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input path does not exist: {}", input.display()),
            )
            .into());
        }
    }
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// `<stem>_deslanted.<ext>` in `out_dir`, or next to the input.
fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    let name = format!("{stem}_deslanted.{ext}");
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn init_logging(verbose: u8) {
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        deslant::core::init_tracing(false);
        let _ = verbose;
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = deslant::core::init_with_level(deslant::core::level_from_verbosity(verbose));
    }
}
