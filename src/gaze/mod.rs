pub mod classifier;
pub mod landmarks;

pub use classifier::{GazeClassifier, GazeConfig, GazeLabel};
pub use landmarks::{LandmarkPoint, LandmarkSet};
