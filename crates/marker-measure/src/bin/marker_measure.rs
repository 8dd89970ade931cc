//! marker-measure CLI: measure objects in a photo next to a fiducial marker.

use clap::Parser;
use marker_measure::aruco::{Dictionary, MarkerDictionary};
use marker_measure::core::LogSettings;
use marker_measure::{
    load_font, load_image, Annotator, DirectorySink, MeasureConfig, MeasurementPipeline,
    MeasurementReport,
};
use std::path::PathBuf;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "marker-measure")]
#[command(about = "Measure object sizes in an image using a fiducial marker as scale reference")]
#[command(version)]
struct Cli {
    /// Path to the input image.
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// JSON pipeline configuration; missing fields use defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the annotated image here.
    #[arg(long, value_name = "FILE")]
    annotated: Option<PathBuf>,

    /// JSON code table (`name`, `marker_size`, `max_correction_bits`,
    /// `codes`); only its markers are accepted.
    #[arg(long, value_name = "FILE")]
    dictionary: Option<PathBuf>,

    /// TrueType font replacing the bundled caption font.
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Write the JSON measurement report here.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Deliver `Result-<stem>.png` and a summary into this directory.
    #[arg(long, value_name = "DIR")]
    sink_dir: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON logs (requires the `tracing` feature).
    #[arg(long)]
    log_json: bool,
}

fn init_logging(cli: &Cli) {
    let settings = LogSettings::from_name(&cli.log_level);
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        marker_measure::core::init_tracing(cli.log_json, &settings);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if cli.log_json {
            eprintln!("--log-json needs the `tracing` feature; using plain logs");
        }
        let _ = marker_measure::core::init(settings);
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut cfg = match &cli.config {
        Some(path) => MeasureConfig::load_json(path)?,
        None => MeasureConfig::default(),
    };
    if let Some(path) = &cli.dictionary {
        let dict = Dictionary::load_json(path)?;
        log::info!("accepting {} codes from {}", dict.codes.len(), dict.name);
        cfg.marker.dictionary = MarkerDictionary::Codes(dict);
    }
    cfg.annotate.enabled = cli.annotated.is_some() || cli.sink_dir.is_some();
    let unit = cfg.annotate.unit.clone();

    let mut annotator = Annotator::new(&cfg.annotate);
    if let Some(path) = &cli.font {
        annotator = annotator.with_font(load_font(path)?);
    }
    let pipeline = MeasurementPipeline::new(cfg)?.with_annotator(annotator);

    let image = load_image(&cli.image)?;
    let result = pipeline.run(&image)?;

    for (i, m) in result.measurements.iter().enumerate() {
        let mark = if i == result.selected { "*" } else { " " };
        println!(
            "{mark} object {i}: width {:.1} {unit}, height {:.1} {unit}",
            m.size.width, m.size.height
        );
    }
    println!(
        "tallest: object {} ({:.1} {unit})",
        result.selected,
        result.selected_measurement().size.height
    );

    if let (Some(path), Some(img)) = (&cli.annotated, &result.annotated) {
        img.save(path)?;
    }
    if let Some(path) = &cli.report {
        MeasurementReport::from_result(&result, Some(&cli.image), &unit).write_json(path)?;
    }
    if let Some(dir) = &cli.sink_dir {
        let stem = cli
            .image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        result.deliver(&mut DirectorySink::new(dir, stem))?;
    }
    Ok(())
}
