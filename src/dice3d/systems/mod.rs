//! Systems module for dice3d
//!
//! The per-roll logic the engine runs once dice are in the tray:
//!
//! - `settle`: settling detection with the liveness timeout
//! - `dice`: orientation-to-value readout and percentile combination

mod dice;
mod settle;

pub use dice::{
    determine_face, die_value, percentile_value, resolve_readings, FaceReader, FaceReading,
    OrientationReader,
};
pub use settle::{SettleStatus, SettleTracker};
