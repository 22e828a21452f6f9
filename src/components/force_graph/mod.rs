mod component;
mod render;
pub mod simulation;
pub mod state;
pub mod types;

pub use component::ForceGraphCanvas;
pub use simulation::Simulation;
pub use state::{ForceGraphState, Tooltip};
