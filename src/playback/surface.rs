use serde::{Deserialize, Serialize};

/// Playback state reported by the surface's own notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlayerState {
    Playing,
    Paused,
}

/// An externally supplied playback handle. The core treats it as an opaque
/// controllable clock: it issues play/pause/seek commands and reads the
/// current position, nothing else.
///
/// Implementations wrap whatever actually renders the video (an embedded
/// player, a test double). Calls arrive from the session controller with its
/// state lock held, so implementations must not call back into the
/// controller synchronously.
pub trait VideoSurface: Send + Sync {
    fn play(&self);
    fn pause(&self);
    fn seek_to(&self, seconds: f64);
    fn current_time(&self) -> f64;
}
