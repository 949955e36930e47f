//! Throw Control Module
//!
//! This module handles how dice leave the hand: the host-adjustable throw
//! strength and aim, and the spawn planner that lays bodies out above the
//! tray and gives each one its random pose and throw.

mod spawn;
mod state;

pub use spawn::*;
pub use state::*;
