//! Type definitions for the dice tray engine
//!
//! This module is organized into submodules:
//! - `dice` - Dice types, expression terms and roll results
//! - `error` - Roll and configuration errors
//! - `settings` - Engine settings and persistence

pub mod dice;
pub mod error;
pub mod settings;

// Re-export all public types for convenient access
pub use dice::*;
pub use error::*;
pub use settings::*;
