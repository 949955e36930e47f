pub mod engine;
pub mod meshes;
pub mod notation;
pub mod rng;
pub mod systems;
pub mod throw_control;
pub mod tray;
pub mod types;
pub mod visuals;

pub use engine::*;
pub use meshes::*;
pub use notation::*;
pub use rng::*;
pub use systems::*;
pub use throw_control::*;
pub use tray::*;
pub use types::*;
pub use visuals::*;
