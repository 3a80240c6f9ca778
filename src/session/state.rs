use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::focus::{FocusConfig, FocusFilter, FocusState};
use crate::gaze::GazeLabel;
use crate::playback::{SessionMode, VideoSurface};
use crate::questions::{ActivePrompt, Question, QuestionScheduler};

use super::summary::{LectureInfo, UserInfo};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    Running,
    Ended,
}

/// Prompt lifecycle for one question: `Idle → QuestionOpen → DecisionOpen →
/// Idle`. At most one instance is ever live.
#[derive(Debug, Clone)]
pub(crate) enum PromptPhase {
    Idle,
    QuestionOpen(ActivePrompt),
    DecisionOpen { prompt: ActivePrompt, correct: bool },
}

impl PromptPhase {
    pub fn active_prompt(&self) -> Option<&ActivePrompt> {
        match self {
            PromptPhase::Idle => None,
            PromptPhase::QuestionOpen(prompt) => Some(prompt),
            PromptPhase::DecisionOpen { prompt, .. } => Some(prompt),
        }
    }
}

/// The controller's single owned mutable unit. Focus state, dwell
/// accumulators, the freeze flag, the prompt, and the prompted set all live
/// behind one lock so every handler sees them move together.
pub(crate) struct SessionState {
    pub phase: SessionPhase,
    pub session_id: Option<String>,
    pub mode: SessionMode,
    pub lecture: LectureInfo,
    pub user: UserInfo,
    pub started_at: Option<DateTime<Utc>>,
    pub filter: FocusFilter,
    pub last_label: GazeLabel,
    /// Append-only focus timeline, one entry per non-frozen sampler tick.
    pub focus_samples: Vec<u8>,
    /// True while a prompt is open: sampling skips, gaze output is discarded.
    pub frozen: bool,
    pub prompt: PromptPhase,
    pub scheduler: QuestionScheduler,
    pub surface: Option<Arc<dyn VideoSurface>>,
    pub is_playing: bool,
    pub external_paused: bool,
    pub last_frame_at: Option<Instant>,
}

impl SessionState {
    pub fn new(focus: FocusConfig) -> Self {
        Self {
            phase: SessionPhase::Idle,
            session_id: None,
            mode: SessionMode::Analyze,
            lecture: LectureInfo {
                title: String::new(),
                video_id: String::new(),
            },
            user: UserInfo {
                name: String::new(),
                profile: String::new(),
            },
            started_at: None,
            filter: FocusFilter::new(focus),
            last_label: GazeLabel::NotDetected,
            focus_samples: Vec::new(),
            frozen: false,
            prompt: PromptPhase::Idle,
            scheduler: QuestionScheduler::default(),
            surface: None,
            is_playing: true,
            external_paused: false,
            last_frame_at: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn begin_session(
        &mut self,
        session_id: String,
        mode: SessionMode,
        lecture: LectureInfo,
        user: UserInfo,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
        focus: FocusConfig,
    ) {
        let surface = self.surface.take();
        *self = Self {
            phase: SessionPhase::Running,
            session_id: Some(session_id),
            mode,
            lecture,
            user,
            started_at: Some(started_at),
            filter: FocusFilter::new(focus),
            scheduler: QuestionScheduler::new(questions),
            surface,
            ..Self::new(FocusConfig::default())
        };
    }

    /// One sampler tick: record the current focus state, unless a prompt has
    /// the session frozen (the tick then leaves no trace, not even a gap).
    pub fn append_sample(&mut self) {
        if self.phase != SessionPhase::Running || self.frozen {
            return;
        }
        self.focus_samples.push(self.filter.state().as_sample());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            mode: self.mode,
            session_id: self.session_id.clone(),
            focus_state: self.filter.state(),
            last_label: self.last_label,
            frozen: self.frozen,
            is_playing: self.is_playing,
            external_paused: self.external_paused,
            sample_count: self.focus_samples.len(),
            prompt: self.prompt.active_prompt().cloned(),
        }
    }
}

/// Read-only view handed to presentation layers. Always a copy; the live
/// state never leaves the controller's lock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub mode: SessionMode,
    pub session_id: Option<String>,
    pub focus_state: FocusState,
    pub last_label: GazeLabel,
    pub frozen: bool,
    pub is_playing: bool,
    pub external_paused: bool,
    pub sample_count: usize,
    pub prompt: Option<ActivePrompt>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn samples_only_accumulate_while_running_and_unfrozen() {
        let mut state = SessionState::new(FocusConfig::default());

        state.append_sample();
        assert_eq!(state.focus_samples.len(), 0);

        state.begin_session(
            "s".to_string(),
            SessionMode::Analyze,
            LectureInfo {
                title: "t".to_string(),
                video_id: "v".to_string(),
            },
            UserInfo {
                name: "n".to_string(),
                profile: "p".to_string(),
            },
            Vec::new(),
            Utc::now(),
            FocusConfig::default(),
        );

        state.append_sample();
        assert_eq!(state.focus_samples, vec![0]);

        state.frozen = true;
        state.append_sample();
        assert_eq!(state.focus_samples, vec![0]);

        state.frozen = false;
        state.append_sample();
        assert_eq!(state.focus_samples, vec![0, 0]);
    }

    #[test]
    fn begin_session_resets_the_timeline_but_keeps_the_surface_slot() {
        let mut state = SessionState::new(FocusConfig::default());
        state.focus_samples = vec![1, 0, 1];
        state.frozen = true;

        state.begin_session(
            "s".to_string(),
            SessionMode::Pause,
            LectureInfo {
                title: "t".to_string(),
                video_id: "v".to_string(),
            },
            UserInfo {
                name: "n".to_string(),
                profile: "p".to_string(),
            },
            Vec::new(),
            Utc::now(),
            FocusConfig::default(),
        );

        assert_eq!(state.phase, SessionPhase::Running);
        assert_eq!(state.focus_samples.len(), 0);
        assert!(!state.frozen);
        assert_eq!(state.mode, SessionMode::Pause);
    }
}
