mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use prost::Message;
use tracing::{info, warn};

use metrosight_core::analyzer::Snapshot;
use metrosight_core::config::{AnalyzerConfig, RegionConfig};
use metrosight_core::ocr::TesseractCli;
use metrosight_core::pipeline::{self, PipelineConfig};
use metrosight_proto::proto;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Analyze {
            input,
            regions,
            output,
            debug_frames,
            tesseract,
        } => {
            info!(?input, ?regions, ?output, "starting analysis");

            let config = analyzer_config(regions.as_deref())?;
            let snapshot = pipeline::analyze_image(
                &input,
                config,
                TesseractCli::new(tesseract),
                debug_frames.as_deref(),
            )
            .context("analysis failed")?;

            print_summary(&snapshot);
            if let Some(output) = output {
                write_snapshots(std::slice::from_ref(&snapshot), &output)?;
            }
            Ok(())
        }
        cli::Command::Session {
            input_dir,
            output,
            regions,
            history,
            max_frames,
            debug_frames,
            tesseract,
        } => {
            info!(?input_dir, ?output, ?max_frames, "starting session");

            let mut config = PipelineConfig::new(input_dir);
            config.analyzer = analyzer_config(regions.as_deref())?;
            config.history_capacity = history;
            config.max_frames = max_frames;
            config.debug_frames_dir = debug_frames;

            let report = pipeline::run_pipeline(&config, TesseractCli::new(tesseract))
                .context("pipeline failed")?;

            if report.history.is_empty() {
                warn!("no frame had a readable score");
            }
            if let Some(latest) = report.history.latest() {
                print_summary(latest);
            }

            write_snapshots(&report.snapshots, &output)?;

            info!(
                frames = report.snapshots.len(),
                live_frames_kept = report.history.len(),
                ?output,
                "session complete"
            );
            Ok(())
        }
    }
}

fn analyzer_config(regions: Option<&Path>) -> Result<AnalyzerConfig> {
    let mut config = AnalyzerConfig::default();
    if let Some(path) = regions {
        config.regions = RegionConfig::load(path).context("failed to load region config")?;
    }
    Ok(config)
}

fn print_summary(snapshot: &Snapshot) {
    println!("frame:       {}", snapshot.frame_number);
    println!("score:       {}", snapshot.score);
    println!("trains:      {}", snapshot.available_trains);
    println!("tunnels:     {}", snapshot.available_tunnels);
    println!("wagons:      {}", snapshot.available_wagons);
    match snapshot.line_indicators.found() {
        Some(c) => println!(
            "lines:       {} available, {} locked, {} placed",
            c.available, c.locked, c.placed
        ),
        None => println!("lines:       --"),
    }
    println!("stations:    {}", snapshot.stations.len());
    for s in &snapshot.stations {
        let d = &s.detection;
        println!("  #{:<4} {:<13} ({}, {})", s.id, d.shape, d.center.0, d.center.1);
    }
    println!("placed lines: {}", snapshot.placed_lines.len());
    for line in &snapshot.placed_lines {
        println!("  {} x{}", line.color, line.segments.len());
    }
    println!("trains seen: {}", snapshot.trains.len());
}

/// Serialize snapshots as length-delimited protobuf and write to file.
fn write_snapshots(snapshots: &[Snapshot], output: &Path) -> Result<()> {
    info!(?output, snapshot_count = snapshots.len(), "writing protobuf output");

    let mut buf = Vec::new();
    for s in snapshots {
        proto::Snapshot::from(s)
            .encode_length_delimited(&mut buf)
            .context("failed to encode Snapshot")?;
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).context("failed to create output directory")?;
    }

    std::fs::write(output, &buf)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(?output, bytes = buf.len(), "protobuf output written");
    Ok(())
}
