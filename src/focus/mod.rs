pub mod hysteresis;

pub use hysteresis::{FocusConfig, FocusFilter, FocusState};
