use crate::generator::profile::{build_sweep, GeneratorConfig};
use crate::gui_bridge::model::{TelemetryBatch, TelemetryFeed};
use crate::workflow::runner::Runner;
use anyhow::Result;
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    thread,
    time::Duration,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

#[derive(Debug, Deserialize)]
struct TelemetryQuery {
    #[serde(default)]
    after: u64,
}

type SharedFeed = Arc<RwLock<TelemetryFeed>>;

fn read(feed: &SharedFeed) -> RwLockReadGuard<'_, TelemetryFeed> {
    feed.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(feed: &SharedFeed) -> RwLockWriteGuard<'_, TelemetryFeed> {
    feed.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Bridge that plays the role of the BLE peripheral: it emits scripted
/// notifications and serves them over HTTP to the visualizer.
pub struct GuiBridge {
    state: SharedFeed,
}

impl GuiBridge {
    pub fn new(script: Vec<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(TelemetryFeed::new(script))),
        }
    }

    /// Starts the HTTP server on its own thread.
    pub fn serve(&self, runner: Arc<Runner>) -> Result<()> {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());

        let telemetry_route = warp::path("telemetry")
            .and(warp::get())
            .and(warp::query::<TelemetryQuery>())
            .and(state_filter.clone())
            .map(|query: TelemetryQuery, state: SharedFeed| {
                let batch: TelemetryBatch = read(&state).batch_after(query.after);
                warp::reply::json(&batch)
            });

        let status_route = warp::path("status")
            .and(warp::get())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .map(|state: SharedFeed, runner: Arc<Runner>| {
                let feed = read(&state);
                warp::reply::json(&json!({
                    "device": runner.config().device,
                    "connected": feed.is_connected(),
                    "last_seq": feed.last_seq(),
                    "script_len": feed.script_len(),
                }))
            });

        let disconnect_route = warp::path("disconnect")
            .and(warp::post())
            .and(state_filter.clone())
            .map(|state: SharedFeed| {
                write(&state).disconnect();
                info!("[GUI] peripheral disconnected on request");
                warp::reply::with_status(
                    warp::reply::json(&json!({"status": "disconnected"})),
                    StatusCode::OK,
                )
            });

        let generator_route = warp::path("ingest-config")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig, state: SharedFeed, runner: Arc<Runner>| async move {
                    match build_sweep(&config).and_then(|lines| {
                        let result = runner.execute(&lines)?;
                        Ok((lines, result))
                    }) {
                        Ok((lines, result)) => {
                            let line_count = lines.len();
                            write(&state).replace_script(lines);
                            if let Some(name) = config.scenario.as_ref() {
                                info!(
                                    "[GUI] Scenario {} -> detections {}",
                                    name,
                                    result.detections.len()
                                );
                            }
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "lines": line_count,
                                    "detections": result.detections.len(),
                                    "description": config.description.clone().unwrap_or_default()
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            error!("ingest-config error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        let runtime = Builder::new_current_thread().enable_all().build()?;
        thread::spawn(move || {
            let routes = telemetry_route
                .or(status_route)
                .or(disconnect_route)
                .or(generator_route);
            runtime.block_on(async move {
                warp::serve(routes).run(gui_bind_address()).await;
            });
        });

        Ok(())
    }

    /// Emits one scripted notification every `interval` on a background thread.
    pub fn stream(&self, interval: Duration) {
        let state = self.state.clone();
        thread::spawn(move || loop {
            write(&state).emit_next();
            thread::sleep(interval);
        });
    }

    /// Emits a single notification; returns its wire text.
    #[cfg(test)]
    pub fn emit(&self) -> Option<String> {
        write(&self.state).emit_next().map(|entry| entry.line.clone())
    }

    pub fn disconnect(&self) {
        write(&self.state).disconnect();
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self, after: u64) -> TelemetryBatch {
        read(&self.state).batch_after(after)
    }
}
