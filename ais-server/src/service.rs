//! Tracking service: single owner of codec, registry and safety monitor.
//!
//! Responsibilities:
//! - Decode incoming sentences and keep the registry current
//! - Run the safety check every `ais_safety_check_interval` (zero disables)
//! - Answer manual checks, snapshots and encode requests
//! - Fan out warnings and safety text messages on a broadcast channel
//!
//! All state lives inside the task; callers talk to it through a cloneable
//! `AisServiceHandle`.

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Interval;
use uom::si::f64::{Angle, Velocity};

use ais_core::codec::AisCodec;
use ais_core::collision::TrackEstimationParameters;
use ais_core::geodesy::GeographicPosition;
use ais_core::messages::AisMessage;
use ais_core::registry::{TargetRegistry, TrackEvent};
use ais_core::safety::{AisWarning, SafetyMonitor};
use ais_core::sentence::SentenceKind;
use ais_core::target::AisTarget;
use ais_core::types::{AisError, Mmsi};

const COMMAND_QUEUE: usize = 1024;
const EVENT_QUEUE: usize = 256;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("tracking service has stopped")]
    Closed,
    #[error(transparent)]
    Ais(#[from] AisError),
}

/// What subscribers receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServiceEvent {
    Warning(AisWarning),
    /// Always a `TrackEvent::TextMessage`.
    Text(TrackEvent),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceStats {
    pub total_sentences: u64,
    pub decoded_messages: u64,
    pub dropped_sentences: u64,
    pub checks_run: u64,
    pub warnings_emitted: u64,
    pub targets: usize,
}

/// Copy of the service state at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSnapshot {
    pub own_ship: Option<AisTarget>,
    /// Sorted by MMSI, own ship excluded.
    pub targets: Vec<AisTarget>,
    pub stats: ServiceStats,
}

enum Command {
    Sentence {
        line: String,
        now: DateTime<Utc>,
    },
    OwnShip {
        position: GeographicPosition,
        speed: Option<Velocity>,
        course: Option<Angle>,
        heading: Option<Angle>,
        now: DateTime<Utc>,
    },
    SetEnabled(bool),
    ClearWarnings,
    CheckNow {
        now: DateTime<Utc>,
        reply: oneshot::Sender<Vec<AisWarning>>,
    },
    Snapshot {
        reply: oneshot::Sender<ServiceSnapshot>,
    },
    Encode {
        msg: Box<AisMessage>,
        reply: oneshot::Sender<Result<Vec<String>, AisError>>,
    },
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AisServiceHandle {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<ServiceEvent>,
}

impl AisServiceHandle {
    async fn send(&self, cmd: Command) -> Result<(), ServiceError> {
        self.tx.send(cmd).await.map_err(|_| ServiceError::Closed)
    }

    async fn request<T>(&self, cmd: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(cmd(reply)).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.events.subscribe()
    }

    /// Feed one raw sentence received at `now`.
    pub async fn send_sentence(&self, line: impl Into<String>, now: DateTime<Utc>) -> Result<(), ServiceError> {
        self.send(Command::Sentence {
            line: line.into(),
            now,
        })
        .await
    }

    /// Own-ship fix from the navigation system.
    pub async fn update_own_ship(
        &self,
        position: GeographicPosition,
        speed: Option<Velocity>,
        course: Option<Angle>,
        heading: Option<Angle>,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        self.send(Command::OwnShip {
            position,
            speed,
            course,
            heading,
            now,
        })
        .await
    }

    /// Enable or disable the periodic check. Manual checks are unaffected.
    pub async fn set_enabled(&self, enabled: bool) -> Result<(), ServiceError> {
        self.send(Command::SetEnabled(enabled)).await
    }

    pub async fn clear_warnings(&self) -> Result<(), ServiceError> {
        self.send(Command::ClearWarnings).await
    }

    /// Run one safety check at `now` and return its warnings. They are
    /// broadcast as well.
    pub async fn check_now(&self, now: DateTime<Utc>) -> Result<Vec<AisWarning>, ServiceError> {
        self.request(|reply| Command::CheckNow { now, reply }).await
    }

    pub async fn snapshot(&self) -> Result<ServiceSnapshot, ServiceError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Encode through the service codec so sequence ids stay unique.
    pub async fn encode(&self, msg: AisMessage) -> Result<Vec<String>, ServiceError> {
        let lines = self
            .request(|reply| Command::Encode {
                msg: Box::new(msg),
                reply,
            })
            .await??;
        Ok(lines)
    }

    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.send(Command::Shutdown).await
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct AisService {
    codec: AisCodec,
    registry: TargetRegistry,
    monitor: SafetyMonitor,
    /// Targets silent for longer than this are dropped on each tick.
    evict_after: Option<TimeDelta>,
    rx: mpsc::Receiver<Command>,
    events: broadcast::Sender<ServiceEvent>,
}

impl AisService {
    /// Build the service and its handle. Fails on an invalid own MMSI.
    pub fn new(
        own_mmsi: Mmsi,
        params: TrackEstimationParameters,
        talker: SentenceKind,
    ) -> Result<(AisService, AisServiceHandle), ServiceError> {
        let registry = TargetRegistry::new(own_mmsi)?;
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let (events, _) = broadcast::channel(EVENT_QUEUE);
        let service = AisService {
            codec: AisCodec::new().with_output_kind(talker),
            registry,
            monitor: SafetyMonitor::new(params),
            evict_after: None,
            rx,
            events: events.clone(),
        };
        Ok((service, AisServiceHandle { tx, events }))
    }

    pub fn with_eviction(mut self, max_age: TimeDelta) -> Self {
        self.evict_after = Some(max_age);
        self
    }

    /// Spawn onto the current runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        let mut ticker = self
            .monitor
            .parameters()
            .ais_safety_check_interval
            .to_std()
            .ok()
            .filter(|d| !d.is_zero())
            .map(tokio::time::interval);
        // First tick completes immediately
        if let Some(t) = ticker.as_mut() {
            t.tick().await;
        }
        info!(
            "AIS service started (own MMSI {}, periodic checks {})",
            self.registry.own_mmsi(),
            if ticker.is_some() { "on" } else { "off" }
        );

        loop {
            // Tick first: a due check never waits behind queued commands.
            tokio::select! {
                biased;

                _ = next_tick(&mut ticker) => self.on_tick(Utc::now()),

                cmd = self.rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
            }
        }

        info!(
            "AIS service stopped: {} sentences, {} warnings",
            self.codec.total_sentences, self.monitor.warnings_emitted
        );
    }

    /// Returns false on shutdown.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Sentence { line, now } => self.on_sentence(&line, now),
            Command::OwnShip {
                position,
                speed,
                course,
                heading,
                now,
            } => self.registry.update_own_ship(position, speed, course, heading, now),
            Command::SetEnabled(enabled) => {
                info!("periodic safety checks {}", if enabled { "enabled" } else { "disabled" });
                self.monitor.set_enabled(enabled);
            }
            Command::ClearWarnings => self.monitor.clear_warnings(),
            Command::CheckNow { now, reply } => {
                let warnings = self.run_check(now);
                let _ = reply.send(warnings);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Encode { msg, reply } => {
                let lines = self
                    .codec
                    .to_sentences(&msg)
                    .map(|sentences| sentences.iter().map(|s| s.to_line()).collect());
                let _ = reply.send(lines);
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn on_sentence(&mut self, line: &str, now: DateTime<Utc>) {
        let Some(msg) = self.codec.decode_line(line) else {
            return;
        };
        for event in self.registry.update(&msg, now) {
            if matches!(event, TrackEvent::TextMessage { .. }) {
                self.publish(ServiceEvent::Text(event));
            }
        }
    }

    fn on_tick(&mut self, now: DateTime<Utc>) {
        if let Some(max_age) = self.evict_after {
            let removed = self.registry.prune_stale(now, max_age);
            if removed > 0 {
                debug!("evicted {removed} stale targets");
            }
        }
        if self.monitor.is_enabled() {
            self.run_check(now);
        }
    }

    fn run_check(&mut self, now: DateTime<Utc>) -> Vec<AisWarning> {
        let warnings = self.monitor.run_safety_check(&mut self.registry, now);
        for w in &warnings {
            self.publish(ServiceEvent::Warning(w.clone()));
        }
        warnings
    }

    /// No subscribers is fine.
    fn publish(&self, event: ServiceEvent) {
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> ServiceSnapshot {
        let mut targets: Vec<AisTarget> = self.registry.targets().cloned().collect();
        targets.sort_by_key(|t| t.mmsi);
        ServiceSnapshot {
            own_ship: self.registry.own_ship().cloned(),
            targets,
            stats: ServiceStats {
                total_sentences: self.codec.total_sentences,
                decoded_messages: self.codec.decoded_messages,
                dropped_sentences: self.codec.dropped_sentences,
                checks_run: self.monitor.checks_run,
                warnings_emitted: self.monitor.warnings_emitted,
                targets: self.registry.targets().count(),
            },
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
