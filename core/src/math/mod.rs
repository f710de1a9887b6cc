pub mod polar;
pub mod stats;

pub use polar::{polar_to_screen, CanvasGeometry};
pub use stats::StatsHelper;
