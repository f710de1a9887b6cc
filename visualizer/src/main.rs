use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Subscription, Task, Theme,
};
use radarcore::decoder::DecoderConfig;
use radarcore::link::{DeviceDescriptor, TelemetrySender};
use radarcore::prelude::{RadarError, Rgba};
use radarcore::render::{RadarConfig, Scene};
use radarcore::session::{RadarSession, SessionEvent};
use serde::Deserialize;
use std::time::{Duration, Instant};

const BRIDGE_URL: &str = "http://127.0.0.1:9000";
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const MAX_FRAME_STEP: Duration = Duration::from_millis(100);
const FAILURES_BEFORE_DISCONNECT: u32 = 3;
const SWEEP_SLICES: usize = 72;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let Some(device) = bridge_device() else {
        log::error!("cannot start visualizer: RADAR_DEVICE_NAME is empty");
        return Err(RadarError::MissingDevice.into());
    };
    iced::application(
        move || Visualizer::boot(device.clone()),
        Visualizer::update,
        Visualizer::view,
    )
    .title(application_title)
    .subscription(application_subscription)
    .theme(application_theme)
    .run()?;
    Ok(())
}

fn application_title(_: &Visualizer) -> String {
    "BLE Radar Visualizer".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    Subscription::batch([
        time::every(FRAME_INTERVAL).map(Message::Frame),
        time::every(POLL_INTERVAL).map(|_| Message::Poll),
    ])
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

/// Device the bridge streams for; `None` when `RADAR_DEVICE_NAME` is set but blank.
fn bridge_device() -> Option<DeviceDescriptor> {
    let name = std::env::var("RADAR_DEVICE_NAME").unwrap_or_else(|_| "simulated-radar".into());
    let name = name.trim();
    (!name.is_empty()).then(|| DeviceDescriptor::new(name, BRIDGE_URL))
}

struct Visualizer {
    session: RadarSession,
    scene: Scene,
    cursor: u64,
    fetch_in_flight: bool,
    failures: u32,
    last_frame: Option<Instant>,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Frame(Instant),
    Poll,
    TelemetryFetched(Result<FetchOutcome, String>),
    Start,
    Stop,
    RequestDisconnect,
    DisconnectSent(Result<String, String>),
}

#[derive(Debug, Clone)]
struct FetchOutcome {
    delivered: usize,
    next: u64,
}

#[derive(Debug, Deserialize)]
struct TelemetryLine {
    line: String,
}

#[derive(Debug, Deserialize)]
struct TelemetryBatch {
    #[serde(default)]
    lines: Vec<TelemetryLine>,
    #[serde(default)]
    connected: bool,
    #[serde(default)]
    next: u64,
}

impl Visualizer {
    fn boot(device: DeviceDescriptor) -> (Self, Task<Message>) {
        let session = RadarSession::attached(device, RadarConfig::default(), DecoderConfig::default());
        let scene = session.scene();
        let status = format!("Attached to {}", session.device().name);
        (
            Visualizer {
                session,
                scene,
                cursor: 0,
                fetch_in_flight: false,
                failures: 0,
                last_frame: None,
                status,
                history: Vec::new(),
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Frame(now) => {
                let dt = state
                    .last_frame
                    .map(|last| now.saturating_duration_since(last).min(MAX_FRAME_STEP))
                    .unwrap_or(FRAME_INTERVAL);
                state.last_frame = Some(now);
                let (events, scene) = state.session.frame(dt);
                for event in events {
                    state.handle_session_event(event);
                }
                state.scene = scene;
                Task::none()
            }
            Message::Poll => {
                if state.fetch_in_flight || !state.session.is_connected() {
                    return Task::none();
                }
                state.fetch_in_flight = true;
                Task::perform(
                    fetch_telemetry(state.session.sender(), state.cursor),
                    Message::TelemetryFetched,
                )
            }
            Message::TelemetryFetched(Ok(outcome)) => {
                state.fetch_in_flight = false;
                state.failures = 0;
                state.cursor = outcome.next;
                if outcome.delivered > 0 {
                    state.status = format!(
                        "Telemetry received: {} notifications (cursor {})",
                        outcome.delivered, outcome.next
                    );
                }
                Task::none()
            }
            Message::TelemetryFetched(Err(err)) => {
                state.fetch_in_flight = false;
                state.failures += 1;
                state.status = format!("Telemetry error: {err}");
                if state.failures >= FAILURES_BEFORE_DISCONNECT {
                    if let Err(err) = state.session.sender().disconnect() {
                        log::warn!("failed to signal disconnect: {}", err);
                    }
                }
                Task::none()
            }
            Message::Start => {
                state.session.start();
                state.push_history("Scanning started".into());
                Task::none()
            }
            Message::Stop => {
                state.session.stop();
                state.scene = state.session.scene();
                state.push_history("Scanning stopped".into());
                Task::none()
            }
            Message::RequestDisconnect => Task::perform(post_disconnect(), Message::DisconnectSent),
            Message::DisconnectSent(Ok(message)) => {
                state.status = message;
                Task::none()
            }
            Message::DisconnectSent(Err(err)) => {
                state.status = format!("Disconnect error: {err}");
                Task::none()
            }
        }
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Detection { angle, x, y } => {
                self.push_history(format!("Detection at {}° -> ({}, {})", angle, x, y));
            }
            SessionEvent::Disconnected => {
                self.status = format!("Device {} disconnected", self.session.device().name);
                self.push_history("Device disconnected".into());
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let metrics = state.session.metrics();
        let scanning = state.session.engine().is_scanning();

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let control_column = column![
            text("Radar").size(26),
            row![
                button("Start")
                    .on_press_maybe((!scanning).then_some(Message::Start))
                    .padding(10),
                button("Stop")
                    .on_press_maybe(scanning.then_some(Message::Stop))
                    .padding(10),
                button("Disconnect")
                    .on_press_maybe(state.session.is_connected().then_some(Message::RequestDisconnect))
                    .padding(10),
            ]
            .spacing(8),
            text(&state.status).size(14),
            text(format!(
                "Notifications: {} received / {} decoded / {} dropped",
                metrics.received, metrics.decoded, metrics.dropped
            ))
            .size(12),
            text(format!(
                "Detections: {} | beyond range: {} | coalesced angles: {}",
                metrics.detections, metrics.out_of_range, metrics.angles_coalesced
            ))
            .size(12),
            text(format!(
                "Sweep {:.1}° | pending angles {} | raindrops {}",
                state.scene.sweep_degrees,
                state.scene.pending_angles,
                state.scene.raindrops.len()
            ))
            .size(12),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(320.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(360.0));

        let radar = Canvas::new(RadarCanvas {
            scene: state.scene.clone(),
        })
        .width(Length::Fill)
        .height(Length::Fill);

        let layout = row![control_column, radar]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

/// Fetches new notifications and forwards them through the telemetry link
/// from the async runtime, off the UI thread.
async fn fetch_telemetry(sender: TelemetrySender, after: u64) -> Result<FetchOutcome, String> {
    let response = reqwest::get(format!("{BRIDGE_URL}/telemetry?after={after}"))
        .await
        .map_err(|e| e.to_string())?;
    let batch = response
        .json::<TelemetryBatch>()
        .await
        .map_err(|e| e.to_string())?;

    let delivered = batch.lines.len();
    for entry in batch.lines {
        sender.notify(entry.line).map_err(|e| e.to_string())?;
    }
    if !batch.connected {
        sender.disconnect().map_err(|e| e.to_string())?;
    }
    Ok(FetchOutcome {
        delivered,
        next: batch.next.max(after),
    })
}

async fn post_disconnect() -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{BRIDGE_URL}/disconnect"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!(
            "Bridge status: {}",
            body["status"].as_str().unwrap_or("unknown")
        ))
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "".into());
        Err(format!("{}: {}", status, text))
    }
}

fn to_color(color: Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, f32::from(color.a) / 255.0)
}

#[derive(Clone)]
struct RadarCanvas {
    scene: Scene,
}

impl RadarCanvas {
    /// Scale and offset fitting the scene's canvas into `bounds`.
    fn fit(&self, bounds: Rectangle) -> (f32, Point) {
        let scale = if self.scene.width > 0.0 && self.scene.height > 0.0 {
            (bounds.width / self.scene.width).min(bounds.height / self.scene.height)
        } else {
            1.0
        };
        let offset = Point::new(
            (bounds.width - self.scene.width * scale) / 2.0,
            (bounds.height - self.scene.height * scale) / 2.0,
        );
        (scale, offset)
    }
}

impl canvas::Program<Message> for RadarCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.02, 0.02, 0.04),
        );

        let (scale, offset) = self.fit(bounds);
        let project = |x: f32, y: f32| Point::new(offset.x + x * scale, offset.y + y * scale);
        let center = project(self.scene.center.x, self.scene.center.y);
        let radius = self.scene.radius * scale;
        let ring_stroke = || {
            Stroke::default()
                .with_width(1.0)
                .with_color(to_color(self.scene.ring_color))
        };

        for &ring in &self.scene.rings {
            let ring_path = Path::new(|builder| builder.circle(center, ring * scale));
            frame.stroke(&ring_path, ring_stroke());
        }

        if !self.scene.cross_lines.is_empty() {
            let axes = Path::new(|builder| {
                for segment in &self.scene.cross_lines {
                    builder.move_to(project(segment.from.x, segment.from.y));
                    builder.line_to(project(segment.to.x, segment.to.y));
                }
            });
            frame.stroke(&axes, ring_stroke());
        }

        for spot in &self.scene.raindrops {
            let marker = Path::new(|builder| {
                builder.circle(project(spot.center.x, spot.center.y), spot.radius * scale)
            });
            frame.fill(&marker, to_color(spot.color));
        }

        if let Some(sweep) = &self.scene.sweep {
            let edge = |degrees: f32| {
                let theta = degrees.to_radians();
                Point::new(center.x + radius * theta.cos(), center.y + radius * theta.sin())
            };
            // the wedge starts at the last fully transparent stop
            let lead = sweep
                .stops
                .iter()
                .rev()
                .find(|stop| stop.color.a == 0)
                .map(|stop| stop.offset)
                .unwrap_or(0.0);
            let span = 1.0 - lead;

            for slice in 0..SWEEP_SLICES {
                let start = lead + span * slice as f32 / SWEEP_SLICES as f32;
                let end = lead + span * (slice + 1) as f32 / SWEEP_SLICES as f32;
                let color = sweep.color_at((start + end) / 2.0);
                if color.a == 0 {
                    continue;
                }
                let wedge = Path::new(|builder| {
                    builder.move_to(center);
                    builder.line_to(edge(sweep.rotation_degrees + start * 360.0));
                    builder.line_to(edge(sweep.rotation_degrees + end * 360.0));
                    builder.close();
                });
                frame.fill(&wedge, to_color(color));
            }
        }

        vec![frame.into_geometry()]
    }
}
