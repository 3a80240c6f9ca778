use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::focus::FocusState;
use crate::questions::{ActivePrompt, QuestionScheduler};

use super::surface::VideoSurface;

/// Session behavior driven by focus transitions. Fixed for the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    /// Passive recording only.
    Analyze,
    /// Pause playback on unfocus, resume on refocus.
    Pause,
    /// Offer a due comprehension question on unfocus instead of pausing.
    Question,
}

/// Apply one mode's side-effect policy to a focus transition.
///
/// Side effects are restricted to surface calls and prompt creation; focus
/// state itself is never touched here. With no surface attached yet, the
/// transition is dropped silently. Returns the prompt to open, if the
/// Question policy selected one — the caller owns the freeze protocol.
pub(crate) fn dispatch_transition(
    mode: SessionMode,
    new_state: FocusState,
    surface: Option<&Arc<dyn VideoSurface>>,
    is_playing: &mut bool,
    scheduler: &mut QuestionScheduler,
) -> Option<ActivePrompt> {
    let Some(surface) = surface else {
        return None;
    };

    match mode {
        SessionMode::Analyze => None,
        SessionMode::Pause => {
            match new_state {
                FocusState::Unfocused if *is_playing => {
                    surface.pause();
                    *is_playing = false;
                    info!("focus lost, playback paused");
                }
                FocusState::Focused if !*is_playing => {
                    surface.play();
                    *is_playing = true;
                    info!("focus regained, playback resumed");
                }
                _ => {}
            }
            None
        }
        SessionMode::Question => {
            if new_state != FocusState::Unfocused {
                return None;
            }
            let playback_seconds = surface.current_time();
            let question = scheduler.take_due(playback_seconds)?;
            info!(
                "focus lost at {playback_seconds:.1}s, opening question due at {}s",
                question.due_at_seconds
            );
            surface.pause();
            *is_playing = false;
            Some(ActivePrompt::present(question))
        }
    }
}
