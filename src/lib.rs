pub mod focus;
pub mod gaze;
pub mod playback;
pub mod questions;
pub mod session;

pub use focus::{FocusConfig, FocusState};
pub use gaze::{GazeClassifier, GazeConfig, GazeLabel, LandmarkPoint, LandmarkSet};
pub use playback::{PlayerState, SessionMode, VideoSurface};
pub use questions::{Decision, QuestionBankSource, RawQuestion};
pub use session::{
    LectureInfo, SessionConfig, SessionController, SessionEvent, SessionSummary, UserInfo,
};
