pub mod controller;
pub mod feed;
pub mod sampler;
pub mod state;
pub mod summary;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::focus::{FocusConfig, FocusState};
use crate::gaze::GazeConfig;
use crate::questions::{ActivePrompt, Decision};

pub use controller::SessionController;
pub use feed::LandmarkFrame;
pub use state::{SessionPhase, SessionSnapshot};
pub use summary::{
    FocusInterval, LectureInfo, LectureSummary, QuartileBreakdown, SessionSummary, UserInfo,
};

/// Tunable knobs for one session. Defaults match the behavior the thresholds
/// were calibrated against; hosts with noisier cameras widen the gaze band
/// or lengthen the dwell thresholds.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub gaze: GazeConfig,
    pub focus: FocusConfig,
    /// Cadence of the focus timeline recorder.
    pub sampler_interval_ms: u64,
    /// Buffered capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gaze: GazeConfig::default(),
            focus: FocusConfig::default(),
            sampler_interval_ms: 3000,
            event_capacity: 64,
        }
    }
}

/// Live notifications for presentation layers. Consumers render status,
/// modals, and charts from these; the core never hands out its mutable state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum SessionEvent {
    FocusChanged {
        timestamp: DateTime<Utc>,
        state: FocusState,
    },
    QuestionOpened {
        prompt: ActivePrompt,
    },
    AnswerSubmitted {
        correct: bool,
    },
    PromptClosed {
        decision: Decision,
    },
    SessionEnded {
        session_id: String,
    },
}
