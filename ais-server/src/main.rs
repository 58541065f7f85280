//! ais-server: CLI + tracking service for AIS.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use log::info;
use uom::si::angle::degree;
use uom::si::f64::{Angle, Velocity};
use uom::si::length::nautical_mile;
use uom::si::velocity::knot;

use ais_core::codec::AisCodec;
use ais_core::collision::{relative_position_to, RelativePosition, TrackEstimationParameters};
use ais_core::config::{self, Config};
use ais_core::geodesy::GeographicPosition;
use ais_core::messages::{AisMessage, ManeuverIndicator, NavigationStatus, PositionReportClassA};
use ais_core::mmsi::format_mmsi;
use ais_core::registry::{TargetRegistry, TrackEvent};
use ais_core::safety::format_tcpa;
use ais_core::sentence::SentenceKind;
use ais_core::target::AisTarget;
use ais_core::types::{Mmsi, MAX_MMSI};

mod notification;
mod service;

use service::{AisService, ServiceEvent, ServiceSnapshot};

#[derive(Parser)]
#[command(name = "ais", version, about = "AIS decoder and collision-risk tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode NMEA sentences from a file and print a target table
    Decode {
        /// File with one sentence per line, `-` for stdin
        file: PathBuf,

        /// Show raw decoded messages instead of summary table
        #[arg(short, long)]
        raw: bool,

        /// One JSON object per decoded message
        #[arg(short, long, conflicts_with = "raw")]
        json: bool,
    },

    /// Replay sentences through the tracking service and report collision risk
    Track {
        /// File with one sentence per line, `-` for stdin
        file: PathBuf,

        /// Own ship MMSI (defaults to the config file)
        #[arg(long, env = "AIS_OWN_MMSI")]
        own_mmsi: Option<Mmsi>,

        /// Run a safety check after every N decoded messages (0: only at the end)
        #[arg(long, default_value = "10")]
        check_every: u64,

        /// Print warnings as JSON lines
        #[arg(short, long)]
        json: bool,
    },

    /// Encode a class A position report
    Encode {
        #[arg(long)]
        mmsi: Mmsi,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Speed over ground in knots
        #[arg(long)]
        sog: Option<f64>,

        /// Course over ground in degrees
        #[arg(long)]
        cog: Option<f64>,

        /// True heading in degrees
        #[arg(long)]
        heading: Option<u16>,

        /// Rate of turn in degrees per minute
        #[arg(long, allow_hyphen_values = true)]
        rot: Option<f64>,

        /// Navigation status code (0-15)
        #[arg(long, default_value = "15")]
        status: u8,

        /// Emit !AIVDM instead of !AIVDO
        #[arg(long)]
        vdm: bool,
    },

    /// One-shot CPA/TCPA between two vessels
    Cpa {
        /// LAT,LON,COG,SOG of the own ship
        #[arg(long, allow_hyphen_values = true)]
        own: String,

        /// LAT,LON,COG,SOG of the other vessel
        #[arg(long, allow_hyphen_values = true)]
        other: String,
    },

    /// Show or create the config file
    Config {
        /// Write a default config if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { file, raw, json } => cmd_decode(file, raw, json),
        Commands::Track {
            file,
            own_mmsi,
            check_every,
            json,
        } => cmd_track(file, own_mmsi, check_every, json),
        Commands::Encode {
            mmsi,
            lat,
            lon,
            sog,
            cog,
            heading,
            rot,
            status,
            vdm,
        } => cmd_encode(mmsi, lat, lon, sog, cog, heading, rot, status, vdm),
        Commands::Cpa { own, other } => cmd_cpa(&own, &other),
        Commands::Config { init } => cmd_config(init),
    }
}

fn open_input(file: &Path) -> Box<dyn BufRead> {
    if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let f = std::fs::File::open(file).unwrap_or_else(|e| {
            eprintln!("Error opening {}: {e}", file.display());
            std::process::exit(1);
        });
        Box::new(io::BufReader::new(f))
    }
}

/// Split `sentence;unix_seconds`. Lines without a time get `fallback`.
fn split_line(line: &str, fallback: DateTime<Utc>) -> Option<(&str, DateTime<Utc>)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match line.split_once(';') {
        Some((sentence, ts)) => {
            let ts = ts
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0) as i64))
                .unwrap_or(fallback);
            Some((sentence.trim(), ts))
        }
        None => Some((line, fallback)),
    }
}

/// Auto-increment for files without timestamps
fn line_step() -> TimeDelta {
    TimeDelta::milliseconds(100)
}

fn cmd_decode(file: PathBuf, raw: bool, json: bool) {
    let reader = open_input(&file);
    let config = config::load_config();
    // Decode has no own ship of its own; the config MMSI is only used to label VDO traffic.
    let own = config.own_ship.mmsi.unwrap_or(MAX_MMSI);
    let mut registry = match TargetRegistry::new(own) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let mut codec = AisCodec::new();
    let mut timestamp = Utc::now();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };
        let Some((sentence, ts)) = split_line(&line, timestamp) else {
            continue;
        };
        timestamp = ts + line_step();

        let Some(msg) = codec.decode_line(sentence) else {
            continue;
        };
        if raw {
            println!("{msg:?}");
        } else if json {
            match serde_json::to_string(&msg) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("Error serializing message: {e}"),
            }
        }
        registry.update(&msg, ts);
    }

    if !raw && !json {
        let mut targets: Vec<&AisTarget> = registry.targets().chain(registry.own_ship()).collect();
        targets.sort_by_key(|t| std::cmp::Reverse(t.message_count));
        print_summary(&targets, &codec);
    }
}

fn cmd_track(file: PathBuf, own_mmsi: Option<Mmsi>, check_every: u64, json: bool) {
    let config = config::load_config();
    let Some(own) = own_mmsi.or(config.own_ship.mmsi) else {
        eprintln!("Error: no own MMSI; pass --own-mmsi or set own_ship.mmsi in {}", config::config_file().display());
        std::process::exit(1);
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(track(file, own, &config, check_every, json)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn track(
    file: PathBuf,
    own: Mmsi,
    config: &Config,
    check_every: u64,
    json: bool,
) -> Result<(), service::ServiceError> {
    // Replayed traffic carries its own clock; checks follow file time.
    let params = TrackEstimationParameters {
        ais_safety_check_interval: TimeDelta::zero(),
        ..config.track_parameters()
    };
    let (svc, handle) = AisService::new(own, params, config.talker)?;
    let task = svc.spawn();

    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event, json),
                Err(RecvError::Lagged(n)) => eprintln!("  [track] dropped {n} events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let reader = open_input(&file);
    let mut timestamp = Utc::now();
    let mut since_check = 0u64;
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };
        let Some((sentence, ts)) = split_line(&line, timestamp) else {
            continue;
        };
        timestamp = ts + line_step();
        handle.send_sentence(sentence, ts).await?;

        since_check += 1;
        if check_every > 0 && since_check >= check_every {
            handle.check_now(ts).await?;
            since_check = 0;
        }
    }
    let end = timestamp - line_step();
    handle.check_now(end).await?;

    let snapshot = handle.snapshot().await?;
    handle.shutdown().await?;
    let _ = task.await;
    drop(handle);
    let _ = printer.await;

    info!("track complete: {}", file.display());
    print_track_summary(&snapshot, end);
    Ok(())
}

fn print_event(event: &ServiceEvent, json: bool) {
    if json {
        if let Some(payload) = notification::event_payload(event) {
            println!("{payload}");
        }
        return;
    }
    match event {
        ServiceEvent::Warning(w) => println!("  [{}] {}", w.timestamp.format("%H:%M:%S"), w.message),
        ServiceEvent::Text(TrackEvent::TextMessage {
            source,
            text,
            timestamp,
            ..
        }) => println!("  [{}] {}: {text}", timestamp.format("%H:%M:%S"), format_mmsi(*source)),
        ServiceEvent::Text(_) => {}
    }
}

fn fmt_opt<T>(v: Option<T>, f: impl Fn(T) -> String) -> String {
    v.map(f).unwrap_or("-".into())
}

fn print_summary(targets: &[&AisTarget], codec: &AisCodec) {
    println!();
    println!(
        "Sentences: {} read, {} decoded, {} dropped, {} targets",
        codec.total_sentences,
        codec.decoded_messages,
        codec.dropped_sentences,
        targets.len()
    );
    println!();

    if targets.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "MMSI", "Kind", "Name", "Call sign", "Country", "Lat", "Lon", "SOG (kts)", "COG", "Hdg",
        "Msgs",
    ]);

    for t in targets {
        let pos = t.has_position().then_some(t.position);
        table.add_row(vec![
            Cell::new(format_mmsi(t.mmsi)),
            Cell::new(t.kind.name()),
            Cell::new(t.name.as_deref().unwrap_or("-")),
            Cell::new(t.call_sign.as_deref().unwrap_or("-")),
            Cell::new(t.country().unwrap_or("-")),
            Cell::new(fmt_opt(pos, |p| format!("{:.4}", p.latitude))),
            Cell::new(fmt_opt(pos, |p| format!("{:.4}", p.longitude))),
            Cell::new(fmt_opt(t.speed_over_ground(), |v| format!("{:.1}", v.get::<knot>()))),
            Cell::new(fmt_opt(t.course_over_ground(), |a| format!("{:.1}", a.get::<degree>()))),
            Cell::new(fmt_opt(t.true_heading(), |a| format!("{:.0}", a.get::<degree>()))),
            Cell::new(t.message_count),
        ]);
    }

    println!("{table}");
}

fn print_track_summary(snapshot: &ServiceSnapshot, now: DateTime<Utc>) {
    let stats = &snapshot.stats;
    println!();
    println!(
        "  Sentences: {} total, {} decoded, {} dropped",
        stats.total_sentences, stats.decoded_messages, stats.dropped_sentences
    );
    println!("  Targets: {}", stats.targets);
    println!("  Safety checks: {}, warnings: {}", stats.checks_run, stats.warnings_emitted);
    match &snapshot.own_ship {
        Some(own) if own.has_position() => println!("  Own ship: {} at {}", own.name_or_mmsi(), own.position),
        _ => println!("  Own ship: no position"),
    }

    let mut rows: Vec<(&AisTarget, &RelativePosition)> = snapshot
        .targets
        .iter()
        .filter_map(|t| t.relative_position.as_ref().map(|r| (t, r)))
        .collect();
    if rows.is_empty() {
        return;
    }
    rows.sort_by(|a, b| a.1.distance.value.total_cmp(&b.1.distance.value));

    println!();
    let mut table = Table::new();
    table.set_header(vec![
        "MMSI", "Name", "Dist (nm)", "Brg", "CPA (nm)", "TCPA", "State", "Age (s)",
    ]);
    for (t, rel) in rows {
        table.add_row(vec![
            Cell::new(format_mmsi(t.mmsi)),
            Cell::new(t.name.as_deref().unwrap_or("-")),
            Cell::new(format!("{:.2}", rel.distance.get::<nautical_mile>())),
            Cell::new(format!("{:.0}", rel.bearing.get::<degree>())),
            Cell::new(fmt_opt(rel.closest_point_of_approach, |c| format!("{:.2}", c.get::<nautical_mile>()))),
            Cell::new(fmt_opt(rel.time_to_closest_point_of_approach(now), format_tcpa)),
            Cell::new(rel.safety_state),
            Cell::new(t.age(now).num_seconds()),
        ]);
    }
    println!("{table}");
}

#[allow(clippy::too_many_arguments)]
fn cmd_encode(
    mmsi: Mmsi,
    lat: f64,
    lon: f64,
    sog: Option<f64>,
    cog: Option<f64>,
    heading: Option<u16>,
    rot: Option<f64>,
    status: u8,
    vdm: bool,
) {
    if mmsi == 0 || mmsi > MAX_MMSI {
        eprintln!("Error: invalid MMSI {mmsi}");
        std::process::exit(1);
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        eprintln!("Error: position {lat},{lon} out of range");
        std::process::exit(1);
    }

    let msg = AisMessage::PositionReportClassA(PositionReportClassA {
        message_type: 1,
        repeat: 0,
        mmsi,
        status: NavigationStatus::from_u8(status),
        rate_of_turn: rot,
        speed_kts: sog,
        position_accuracy: false,
        lon: Some(lon),
        lat: Some(lat),
        course_deg: cog,
        heading_deg: heading,
        timestamp_second: None,
        maneuver: ManeuverIndicator::NotAvailable,
        raim: false,
        radio_status: 0,
    });

    let kind = if vdm { SentenceKind::Vdm } else { SentenceKind::Vdo };
    let mut codec = AisCodec::new().with_output_kind(kind);
    match codec.to_sentences(&msg) {
        Ok(sentences) => {
            for s in sentences {
                println!("{}", s.to_line());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Parse `LAT,LON,COG,SOG` into a ship target seen at `now`.
fn parse_vessel(mmsi: Mmsi, text: &str, now: DateTime<Utc>) -> Result<AisTarget, String> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid vessel '{text}': {e}"))?;
    let [lat, lon, cog, sog] = parts[..] else {
        return Err(format!("invalid vessel '{text}': expected LAT,LON,COG,SOG"));
    };
    let position = GeographicPosition::from_lat_lon(lat, lon);
    if !position.is_valid() {
        return Err(format!("invalid vessel '{text}': position out of range"));
    }
    Ok(AisTarget::ship(mmsi, now)
        .with_position(position)
        .with_course(Angle::new::<degree>(cog))
        .with_speed(Velocity::new::<knot>(sog)))
}

fn cmd_cpa(own: &str, other: &str) {
    let now = Utc::now();
    let (own, other) = match (parse_vessel(1, own, now), parse_vessel(2, other, now)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let params = config::load_config().track_parameters();

    let rel = match relative_position_to(&own, &other, now, &params) {
        Ok(Some(rel)) => rel,
        Ok(None) => {
            eprintln!("Error: no valid positions");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!();
    println!("  Distance:  {:.3} nm", rel.distance.get::<nautical_mile>());
    println!("  Bearing:   {:.1}°", rel.bearing.get::<degree>());
    println!(
        "  CPA:       {}",
        fmt_opt(rel.closest_point_of_approach, |c| format!("{:.3} nm", c.get::<nautical_mile>()))
    );
    println!("  TCPA:      {}", fmt_opt(rel.time_to_closest_point_of_approach(now), format_tcpa));
    println!("  State:     {}", rel.safety_state);
    println!();
}

fn cmd_config(init: bool) {
    let path = config::config_file();
    if init {
        if path.exists() {
            println!("Config already exists: {}", path.display());
        } else {
            match config::save_config(&Config::default()) {
                Ok(p) => println!("Wrote default config to {}", p.display()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        return;
    }

    println!("# {}", path.display());
    print!("{}", config::serialize_config(&config::load_config()));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 1, 10, 10, 0).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_line() {
        let (s, ts) = split_line("!AIVDM,1,1,,B,13GmFd002pwrel@LpMu8L6qn8Vp0,0*56;1698833400.5", t0()).unwrap();
        assert_eq!(s, "!AIVDM,1,1,,B,13GmFd002pwrel@LpMu8L6qn8Vp0,0*56");
        assert_eq!(ts.timestamp_millis(), 1_698_833_400_500);

        let (_, ts) = split_line("  !AIVDM,1,1,,B,x,0*00  ", t0()).unwrap();
        assert_eq!(ts, t0());
        let (_, ts) = split_line("!AIVDM,1,1,,B,x,0*00;soon", t0()).unwrap();
        assert_eq!(ts, t0());

        assert!(split_line("", t0()).is_none());
        assert!(split_line("# comment", t0()).is_none());
    }

    #[test]
    fn test_parse_vessel() {
        let t = parse_vessel(1, "47.05, 9.05, 0, 5", t0()).unwrap();
        assert!(t.has_position());
        assert_eq!(t.speed_over_ground(), Some(Velocity::new::<knot>(5.0)));

        assert!(parse_vessel(1, "47.05,9.05,0", t0()).is_err());
        assert!(parse_vessel(1, "47.05,9.05,zero,5", t0()).is_err());
        assert!(parse_vessel(1, "95,9.05,0,5", t0()).is_err());
    }

    #[test]
    fn test_parse_vessel_cpa() {
        let own = parse_vessel(1, "47.05,9.05,0,5", t0()).unwrap();
        let other = parse_vessel(2, "47.1,9.1,270,10", t0()).unwrap();
        let rel = relative_position_to(&own, &other, t0(), &TrackEstimationParameters::default())
            .unwrap()
            .unwrap();
        let cpa = rel.closest_point_of_approach.unwrap().get::<nautical_mile>();
        assert!((cpa - 1.7665).abs() < 0.01, "cpa {cpa}");
    }

    #[test]
    fn test_track_replay_from_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.nmea");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "# capture").unwrap();
        writeln!(f, "!AIVDM,1,1,,B,13GmFd002pwrel@LpMu8L6qn8Vp0,0*56;1698833400").unwrap();
        writeln!(f, "garbage;1698833401").unwrap();
        drop(f);

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let config = Config::default();
        runtime
            .block_on(track(path, 269110660, &config, 1, true))
            .unwrap();
    }
}
