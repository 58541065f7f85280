//! ais-core: Pure decode + tracking library for AIS.
//!
//! No async, no I/O besides the config file. Sentences go in through
//! `AisCodec`, decoded messages feed the `TargetRegistry`, and the
//! `SafetyMonitor` turns the registry into collision warnings. The
//! `ais-server` crate wires these into a CLI and a tokio service.

pub mod assembler;
pub mod codec;
pub mod collision;
pub mod config;
pub mod decode;
pub mod encode;
pub mod geodesy;
pub mod messages;
pub mod mmsi;
pub mod payload;
pub mod registry;
pub mod safety;
pub mod sentence;
pub mod target;
pub mod types;

// Re-export commonly used types at crate root
pub use codec::AisCodec;
pub use collision::{relative_position_to, RelativePosition, SafetyState, TrackEstimationParameters};
pub use geodesy::GeographicPosition;
pub use messages::AisMessage;
pub use registry::{TargetRegistry, TrackEvent};
pub use safety::{AisWarning, AisWarningType, SafetyMonitor};
pub use target::{AisTarget, TargetKind};
pub use types::*;
