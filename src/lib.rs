//! Physics-simulated, provably-fair polyhedral dice.
//!
//! Dice are thrown into a rapier tray with cryptographically secure poses
//! and impulses, and read off their resting orientation against fixed face
//! tables. See [`dice3d::DiceEngine`] for the roll lifecycle.

pub mod dice3d;

pub use dice3d::{
    parse, DiceEngine, DiceRollResult, EngineEvent, PendingRoll, RollError, RollPhase, TrayConfig,
};
