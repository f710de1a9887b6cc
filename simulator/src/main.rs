use anyhow::Context;
use clap::Parser;
use generator::profile::build_sweep;
use gui_bridge::bridge::GuiBridge;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Simulated BLE radar peripheral and telemetry replay driver")]
struct Args {
    /// Replay the telemetry once through a headless radar and write a report
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Replay recorded notifications (one wire line per row) instead of generating them
    #[arg(long)]
    telemetry: Option<PathBuf>,
    #[arg(long, default_value_t = 1)]
    step_degrees: u16,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Milliseconds between streamed notifications
    #[arg(long, default_value_t = 16)]
    interval_ms: u64,
    /// Keep the HTTP bridge alive and stream telemetry to the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn read_telemetry_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading telemetry file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.step_degrees, args.seed)
    };

    let lines = match args.telemetry.as_deref() {
        Some(path) => read_telemetry_file(path)?,
        None => build_sweep(&workflow_config.generator).context("generating telemetry sweep")?,
    };

    let runner = Runner::new(workflow_config).context("validating workflow")?;
    let gui_bridge = GuiBridge::new(lines.clone());

    if args.offline {
        let result = runner.execute(&lines)?;

        println!(
            "Offline run -> lines {}, detections {}, dropped {}, raindrops alive {}",
            lines.len(),
            result.detections.len(),
            result.metrics.dropped,
            result.raindrops_alive
        );

        let report = serde_json::to_string(&result).context("serializing offline report")?;
        let report_path = PathBuf::from("tools/data/offline_radar.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&report_path)?;
        writeln!(file, "{}", report)?;
        gui_bridge.publish_status("Offline replay report written.");
    }
    if args.serve {
        gui_bridge.serve(Arc::new(runner)).context("starting HTTP bridge")?;
        gui_bridge.stream(Duration::from_millis(args.interval_ms.max(1)));
        gui_bridge.publish_status("HTTP bridge streaming telemetry (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
        gui_bridge.disconnect();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn telemetry_file_skips_blank_rows() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all("5°--80m)\n\n  10°--50m)  \n".as_bytes()).unwrap();
        let lines = read_telemetry_file(temp.path()).unwrap();
        assert_eq!(lines, vec!["5°--80m)", "10°--50m)"]);
    }

    #[test]
    fn bundled_sample_replays_with_two_detections() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/workflows/sample_telemetry.txt"));
        let lines = read_telemetry_file(path).unwrap();
        let runner = Runner::new(WorkflowConfig::from_args(1, 0)).unwrap();

        let result = runner.execute(&lines).unwrap();

        let angles: Vec<u16> = result.detections.iter().map(|d| d.angle).collect();
        assert_eq!(angles, vec![10, 30]);
        assert_eq!(result.metrics.dropped, 1);
        assert_eq!(result.metrics.out_of_range, 2);
    }

    #[test]
    fn missing_telemetry_file_is_an_error() {
        assert!(read_telemetry_file(Path::new("/nonexistent/telemetry.txt")).is_err());
    }
}
