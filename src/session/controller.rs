use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::sync::{broadcast, mpsc::UnboundedReceiver, Mutex};
use tokio::time::Instant;
use uuid::Uuid;

use crate::gaze::{GazeClassifier, GazeLabel, LandmarkSet};
use crate::playback::dispatcher::dispatch_transition;
use crate::playback::{PlayerState, SessionMode, VideoSurface};
use crate::questions::{normalize_questions, Decision, QuestionBankSource};

use super::feed::{FrameFeed, LandmarkFrame};
use super::sampler::SamplerController;
use super::state::{PromptPhase, SessionPhase, SessionSnapshot, SessionState};
use super::summary::{build_summary, LectureInfo, SessionSummary, UserInfo};
use super::{SessionConfig, SessionEvent};

/// Owns one attention-monitoring session end to end: gaze classification,
/// the focus hysteresis filter, the periodic focus sampler, mode-dependent
/// playback control, and the question freeze protocol.
///
/// All mutable session state sits behind a single lock, so the three
/// producers feeding the controller (landmark frames, sampler ticks, user
/// prompt interaction) are serialized no matter how the host schedules them.
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    config: SessionConfig,
    classifier: GazeClassifier,
    state: Arc<Mutex<SessionState>>,
    sampler: Arc<Mutex<SamplerController>>,
    feed: Arc<Mutex<FrameFeed>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            classifier: GazeClassifier::new(config.gaze.clone()),
            state: Arc::new(Mutex::new(SessionState::new(config.focus.clone()))),
            sampler: Arc::new(Mutex::new(SamplerController::new())),
            feed: Arc::new(Mutex::new(FrameFeed::new())),
            config,
            events,
        }
    }

    /// Live focus/prompt/session notifications for presentation layers.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Begin a session. In `Question` mode the bank is consulted for the
    /// lecture's questions; a failed fetch degrades to an empty list (the
    /// session still records and the other behaviors still run).
    pub async fn start_session(
        &self,
        mode: SessionMode,
        lecture: LectureInfo,
        user: UserInfo,
        bank: &dyn QuestionBankSource,
    ) -> Result<String> {
        let questions = if mode == SessionMode::Question {
            match bank.fetch_questions(&lecture.video_id) {
                Ok(raw) => normalize_questions(raw),
                Err(err) => {
                    warn!(
                        "question bank fetch failed for {}, continuing without questions: {err:#}",
                        lecture.video_id
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        {
            let mut state = self.state.lock().await;
            if state.phase == SessionPhase::Running {
                bail!("session already active");
            }
            state.begin_session(
                session_id.clone(),
                mode,
                lecture,
                user,
                questions,
                started_at,
                self.config.focus.clone(),
            );
        }

        self.sampler
            .lock()
            .await
            .start(self.state.clone(), self.config.sampler_interval_ms)?;

        info!("session {session_id} started in {mode:?} mode");
        Ok(session_id)
    }

    /// Hand over the playback surface once it is ready. Gaze events arriving
    /// before this are dropped silently. The surface is immediately driven
    /// to match the session's external-pause state.
    pub async fn attach_surface(&self, surface: Arc<dyn VideoSurface>) {
        let mut state = self.state.lock().await;
        if state.external_paused {
            surface.pause();
            state.is_playing = false;
        } else {
            surface.play();
            state.is_playing = true;
        }
        state.surface = Some(surface);
    }

    /// Playback state notification from the surface itself (user clicked the
    /// player's own controls, buffering ended, and so on).
    pub async fn surface_state_changed(&self, player_state: PlayerState) {
        let mut state = self.state.lock().await;
        state.is_playing = player_state == PlayerState::Playing;
    }

    /// Subscribe the landmark provider. Frames flow through `ingest_frame`
    /// until the channel closes or the session ends.
    pub async fn attach_frames(&self, frames: UnboundedReceiver<LandmarkFrame>) -> Result<()> {
        self.feed.lock().await.start(self.clone(), frames)
    }

    /// One landmark callback: classify, measure the wall-clock delta from
    /// the previous frame, and advance the focus machinery. `None` means no
    /// face was detected.
    pub async fn ingest_frame(&self, frame: Option<&LandmarkSet>) {
        let label = self.classifier.classify(frame);
        let now = Instant::now();

        let mut state = self.state.lock().await;
        let elapsed_ms = match state.last_frame_at.replace(now) {
            Some(previous) => now.duration_since(previous).as_millis() as u64,
            None => 0,
        };
        self.advance_locked(&mut state, label, elapsed_ms);
    }

    /// Delta-explicit variant of `ingest_frame` for hosts that carry their
    /// own clock alongside classified labels.
    pub async fn advance_gaze(&self, label: GazeLabel, elapsed_ms: u64) {
        let mut state = self.state.lock().await;
        self.advance_locked(&mut state, label, elapsed_ms);
    }

    fn advance_locked(&self, state: &mut SessionState, label: GazeLabel, elapsed_ms: u64) {
        if state.phase != SessionPhase::Running {
            return;
        }
        state.last_label = label;

        // While a prompt is open the classifier output is discarded: no
        // dwell accumulation, no transitions, no playback side effects.
        if state.frozen {
            return;
        }

        let externally_paused = state.external_paused;
        let Some(new_state) = state.filter.advance(label, elapsed_ms, externally_paused) else {
            return;
        };

        let _ = self.events.send(SessionEvent::FocusChanged {
            timestamp: Utc::now(),
            state: new_state,
        });

        let mode = state.mode;
        let SessionState {
            surface,
            is_playing,
            scheduler,
            ..
        } = &mut *state;

        if let Some(prompt) = dispatch_transition(mode, new_state, surface.as_ref(), is_playing, scheduler)
        {
            state.frozen = true;
            state.prompt = PromptPhase::QuestionOpen(prompt.clone());
            let _ = self.events.send(SessionEvent::QuestionOpened { prompt });
        }
    }

    /// External pause, distinct from focus-driven pause: the surface is
    /// paused or resumed directly, and while paused, center gaze counts as a
    /// negative signal so the session cannot re-arm toward `Focused`.
    pub async fn set_paused(&self, paused: bool) {
        let mut state = self.state.lock().await;
        state.external_paused = paused;
        if let Some(surface) = &state.surface {
            if paused {
                surface.pause();
                state.is_playing = false;
            } else {
                surface.play();
                state.is_playing = true;
            }
        }
    }

    /// Submit the user's answer to the open question. Returns whether it was
    /// correct and moves the prompt to the decision stage; the session stays
    /// frozen until the decision resolves.
    pub async fn answer(&self, key: u8) -> Result<bool> {
        let mut state = self.state.lock().await;
        match &state.prompt {
            PromptPhase::QuestionOpen(prompt) => {
                let Some(correct) = prompt.answer_is_correct(key) else {
                    bail!("unknown answer key {key}");
                };
                let prompt = prompt.clone();
                state.prompt = PromptPhase::DecisionOpen { prompt, correct };
                let _ = self.events.send(SessionEvent::AnswerSubmitted { correct });
                Ok(correct)
            }
            _ => bail!("no question open"),
        }
    }

    /// Resolve the decision stage: `Continue` resumes from the current
    /// position, `Rewind` seeks back to the question's due time first.
    /// Either way the freeze lifts and the prompt slot frees up.
    pub async fn decide(&self, decision: Decision) -> Result<()> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut state.prompt, PromptPhase::Idle) {
            PromptPhase::DecisionOpen { prompt, .. } => {
                state.frozen = false;
                if let Some(surface) = &state.surface {
                    if decision == Decision::Rewind {
                        surface.seek_to(prompt.question.due_at_seconds as f64);
                    }
                    surface.play();
                    state.is_playing = true;
                }
                let _ = self.events.send(SessionEvent::PromptClosed { decision });
                Ok(())
            }
            other => {
                state.prompt = other;
                bail!("no decision to resolve");
            }
        }
    }

    /// End the session and build the focus summary.
    ///
    /// The sampler and the landmark feed are stopped and joined before the
    /// sample snapshot is taken, so no tick can extend the timeline after
    /// the summary exists.
    pub async fn end_session(&self) -> Result<SessionSummary> {
        self.feed.lock().await.stop().await?;
        self.sampler.lock().await.stop().await?;

        let ended_at = Utc::now();
        let mut state = self.state.lock().await;
        if state.phase != SessionPhase::Running {
            bail!("no active session to end");
        }
        state.phase = SessionPhase::Ended;

        let session_id = state
            .session_id
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let started_at = state.started_at.unwrap_or(ended_at);

        let summary = build_summary(
            session_id.clone(),
            state.lecture.clone(),
            state.user.clone(),
            &state.focus_samples,
            started_at,
            ended_at,
            self.config.sampler_interval_ms,
        );

        let _ = self.events.send(SessionEvent::SessionEnded {
            session_id: session_id.clone(),
        });
        info!(
            "session {session_id} ended with {} samples, {}ms unfocused",
            summary.focus_intervals.len(),
            summary.total_unfocused_ms
        );

        Ok(summary)
    }

    /// Read-only view of the live session for status displays.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
