pub mod dispatcher;
pub mod surface;

pub use dispatcher::SessionMode;
pub use surface::{PlayerState, VideoSurface};
