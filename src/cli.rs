use crate::config::{Config, load_config};
use crate::layout::NodePatch;
use crate::layout_dump::write_layout_dump;
use crate::render::{write_output_png, write_output_svg};
use crate::source::DirectorySource;
use crate::{RenderOptions, apply_options};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pnmlc",
    version,
    about = "Render a PNML reference model with event-log conformance overlaid"
)]
pub struct Args {
    /// Directory holding reference_model.pnml, mapping.txt and the statistics files
    #[arg(short = 'd', long = "data-dir", default_value = ".")]
    pub data_dir: PathBuf,

    /// Reference model (.pnml); overrides the data directory
    #[arg(long = "model")]
    pub model: Option<PathBuf>,

    /// Label to state-code mapping
    #[arg(long = "mapping")]
    pub mapping: Option<PathBuf>,

    /// Observed transition statistics (JSON)
    #[arg(long = "transitions")]
    pub transitions: Option<PathBuf>,

    /// Deviation counts per state (JSON)
    #[arg(long = "deviations")]
    pub deviations: Option<PathBuf>,

    /// Average time per state (JSON)
    #[arg(long = "durations")]
    pub durations: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, layout, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Draw observed transitions the model does not allow
    #[arg(short = 'n', long = "show-non-compliant")]
    pub show_non_compliant: bool,

    /// Show the deviation chart of a node (repeatable)
    #[arg(long = "chart", value_name = "NODE_ID")]
    pub charts: Vec<String>,

    /// Move a node before rendering (repeatable)
    #[arg(long = "move", value_name = "ID=X,Y", value_parser = parse_move)]
    pub moves: Vec<NodePatch>,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout", value_name = "PATH")]
    pub dump_layout: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();

    let config = resolve_config(&args)?;
    let source = data_source(&args);
    log::info!("reading reference model from {}", source.model.display());

    let mut options = RenderOptions::from_config(config.clone())
        .with_show_non_compliant(args.show_non_compliant);
    options.charts = args.charts.clone();
    options.moves = args.moves.clone();

    let view = apply_options(&source, options)
        .with_context(|| format!("failed to build conformance graph from {}", args.data_dir.display()))?;
    for warning in &view.layout().warnings {
        log::debug!("build warning: {warning}");
    }

    if let Some(path) = &args.dump_layout {
        write_layout_dump(path, view.layout(), view.charts())?;
    }

    let svg = view.render_svg();
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render, &config.theme)?;
        }
    }
    Ok(())
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    Ok(config)
}

fn data_source(args: &Args) -> DirectorySource {
    let mut source = DirectorySource::new(&args.data_dir);
    if let Some(path) = &args.model {
        source = source.with_model(path);
    }
    if let Some(path) = &args.mapping {
        source = source.with_mapping(path);
    }
    if let Some(path) = &args.transitions {
        source = source.with_transitions(path);
    }
    if let Some(path) = &args.deviations {
        source = source.with_deviations(path);
    }
    if let Some(path) = &args.durations {
        source = source.with_durations(path);
    }
    source
}

fn parse_move(raw: &str) -> std::result::Result<NodePatch, String> {
    let (id, coords) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=X,Y, got '{raw}'"))?;
    let (x, y) = coords
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y after '=', got '{coords}'"))?;
    let x: f32 = x.trim().parse().map_err(|_| format!("invalid x coordinate '{x}'"))?;
    let y: f32 = y.trim().parse().map_err(|_| format!("invalid y coordinate '{y}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing node id in '{raw}'"));
    }
    Ok(NodePatch::new(id, x, y))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}
