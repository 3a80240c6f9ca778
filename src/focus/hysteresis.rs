use serde::{Deserialize, Serialize};

use crate::gaze::GazeLabel;

/// Debounced attention state. Sessions start unfocused and have to earn
/// `Focused` through sustained center gaze.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FocusState {
    Focused,
    Unfocused,
}

impl FocusState {
    pub fn as_sample(self) -> u8 {
        match self {
            FocusState::Focused => 1,
            FocusState::Unfocused => 0,
        }
    }
}

/// Dwell thresholds for the hysteresis filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusConfig {
    /// Sustained center gaze required before flipping to `Focused`.
    pub focus_threshold_ms: u64,
    /// Sustained away/absent gaze required before flipping to `Unfocused`.
    pub unfocus_threshold_ms: u64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            focus_threshold_ms: 2000,
            unfocus_threshold_ms: 2000,
        }
    }
}

/// Symmetric two-threshold hysteresis filter over gaze labels.
///
/// Blinks and brief glances reset the opposing dwell accumulator instead of
/// flipping state, so playback control doesn't thrash. Elapsed time is the
/// wall-clock delta between consecutive landmark callbacks; the provider's
/// cadence is not uniform, so the filter never assumes a fixed tick. If the
/// provider stalls, dwell accumulation stalls with it.
#[derive(Debug, Clone)]
pub struct FocusFilter {
    config: FocusConfig,
    state: FocusState,
    focused_accum_ms: u64,
    unfocused_accum_ms: u64,
}

impl FocusFilter {
    pub fn new(config: FocusConfig) -> Self {
        Self {
            config,
            state: FocusState::Unfocused,
            focused_accum_ms: 0,
            unfocused_accum_ms: 0,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Feed one classified frame. Returns the new state when a transition
    /// fires, `None` otherwise.
    ///
    /// Center gaze while the session is externally paused counts as a
    /// negative signal: an externally paused session can drift to
    /// `Unfocused` but never re-arm toward `Focused`.
    pub fn advance(
        &mut self,
        label: GazeLabel,
        elapsed_ms: u64,
        externally_paused: bool,
    ) -> Option<FocusState> {
        let positive = label == GazeLabel::Center && !externally_paused;

        if positive {
            self.unfocused_accum_ms = 0;
            if self.state == FocusState::Unfocused {
                self.focused_accum_ms = self.focused_accum_ms.saturating_add(elapsed_ms);
                if self.focused_accum_ms >= self.config.focus_threshold_ms {
                    self.state = FocusState::Focused;
                    self.focused_accum_ms = 0;
                    return Some(self.state);
                }
            } else {
                self.focused_accum_ms = 0;
            }
        } else {
            self.focused_accum_ms = 0;
            if self.state == FocusState::Focused {
                self.unfocused_accum_ms = self.unfocused_accum_ms.saturating_add(elapsed_ms);
                if self.unfocused_accum_ms >= self.config.unfocus_threshold_ms {
                    self.state = FocusState::Unfocused;
                    self.unfocused_accum_ms = 0;
                    return Some(self.state);
                }
            } else {
                self.unfocused_accum_ms = 0;
            }
        }

        None
    }
}

impl Default for FocusFilter {
    fn default() -> Self {
        Self::new(FocusConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drive(filter: &mut FocusFilter, label: GazeLabel, step_ms: u64, steps: usize) -> Vec<FocusState> {
        (0..steps)
            .filter_map(|_| filter.advance(label, step_ms, false))
            .collect()
    }

    #[test]
    fn never_flips_before_threshold() {
        let mut filter = FocusFilter::default();
        // 1900ms of center gaze in 100ms steps: still short of 2000.
        let transitions = drive(&mut filter, GazeLabel::Center, 100, 19);
        assert_eq!(transitions, vec![]);
        assert_eq!(filter.state(), FocusState::Unfocused);
    }

    #[test]
    fn sustained_center_flips_focused_once_at_threshold() {
        let mut filter = FocusFilter::default();
        // Scenario: continuous center for 2500ms starting unfocused.
        let transitions = drive(&mut filter, GazeLabel::Center, 100, 25);
        assert_eq!(transitions, vec![FocusState::Focused]);
    }

    #[test]
    fn alternating_gaze_never_reaches_focused() {
        let mut filter = FocusFilter::default();
        // Scenario: center/left alternating every 500ms for 5 seconds.
        for _ in 0..5 {
            assert_eq!(filter.advance(GazeLabel::Center, 500, false), None);
            assert_eq!(filter.advance(GazeLabel::Left, 500, false), None);
        }
        assert_eq!(filter.state(), FocusState::Unfocused);
    }

    #[test]
    fn center_after_focused_is_idempotent() {
        let mut filter = FocusFilter::default();
        drive(&mut filter, GazeLabel::Center, 500, 4);
        assert_eq!(filter.state(), FocusState::Focused);
        // Repeated center frames keep state and leave the accumulator at 0.
        let transitions = drive(&mut filter, GazeLabel::Center, 500, 20);
        assert_eq!(transitions, vec![]);
        assert_eq!(filter.state(), FocusState::Focused);
        assert_eq!(filter.focused_accum_ms, 0);
    }

    #[test]
    fn sustained_negative_flips_back_to_unfocused() {
        let mut filter = FocusFilter::default();
        drive(&mut filter, GazeLabel::Center, 1000, 2);
        assert_eq!(filter.state(), FocusState::Focused);

        assert_eq!(filter.advance(GazeLabel::Right, 1500, false), None);
        assert_eq!(
            filter.advance(GazeLabel::NotDetected, 500, false),
            Some(FocusState::Unfocused)
        );
    }

    #[test]
    fn brief_glance_resets_unfocus_accumulator() {
        let mut filter = FocusFilter::default();
        drive(&mut filter, GazeLabel::Center, 1000, 2);

        assert_eq!(filter.advance(GazeLabel::Left, 1900, false), None);
        // A single center frame interrupts the dwell...
        assert_eq!(filter.advance(GazeLabel::Center, 100, false), None);
        // ...so another 1900ms away still isn't enough.
        assert_eq!(filter.advance(GazeLabel::Left, 1900, false), None);
        assert_eq!(filter.state(), FocusState::Focused);
    }

    #[test]
    fn external_pause_turns_center_into_negative_signal() {
        let mut filter = FocusFilter::default();
        // Center gaze can't arm the focus accumulator while paused.
        for _ in 0..10 {
            assert_eq!(filter.advance(GazeLabel::Center, 500, true), None);
        }
        assert_eq!(filter.state(), FocusState::Unfocused);

        // And a focused session drifts unfocused under external pause.
        let mut filter = FocusFilter::default();
        drive(&mut filter, GazeLabel::Center, 1000, 2);
        assert_eq!(filter.advance(GazeLabel::Center, 2000, true), Some(FocusState::Unfocused));
    }

    #[test]
    fn custom_thresholds_apply() {
        let mut filter = FocusFilter::new(FocusConfig {
            focus_threshold_ms: 500,
            unfocus_threshold_ms: 3000,
        });
        assert_eq!(
            filter.advance(GazeLabel::Center, 500, false),
            Some(FocusState::Focused)
        );
        assert_eq!(filter.advance(GazeLabel::Left, 2999, false), None);
        assert_eq!(
            filter.advance(GazeLabel::Left, 1, false),
            Some(FocusState::Unfocused)
        );
    }
}
