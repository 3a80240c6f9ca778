use serde::{Deserialize, Serialize};

use super::landmarks::{
    LandmarkSet, LEFT_EYE_INNER, LEFT_EYE_OUTER, LEFT_IRIS_CENTER, RIGHT_EYE_INNER,
    RIGHT_EYE_OUTER, RIGHT_IRIS_CENTER,
};

/// Discrete horizontal gaze direction for one landmark frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GazeLabel {
    Center,
    Left,
    Right,
    NotDetected,
}

/// Gaze ratio cutoffs with tunable thresholds.
///
/// The iris-position ratio lands near 0.5 when looking at the screen; the
/// cutoffs are deliberately lenient because detector noise varies with
/// camera placement and lighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeConfig {
    /// Ratio below this reads as looking left.
    pub left_cutoff: f64,
    /// Ratio above this reads as looking right.
    pub right_cutoff: f64,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            left_cutoff: 0.42,
            right_cutoff: 0.58,
        }
    }
}

/// Stateless landmark-to-gaze classifier. Deterministic for identical input.
#[derive(Debug, Clone, Default)]
pub struct GazeClassifier {
    config: GazeConfig,
}

impl GazeClassifier {
    pub fn new(config: GazeConfig) -> Self {
        Self { config }
    }

    /// Classify one frame. `None` (no face in frame) and landmark sets that
    /// are missing the eye triples both come back as `NotDetected`.
    pub fn classify(&self, frame: Option<&LandmarkSet>) -> GazeLabel {
        let Some(landmarks) = frame else {
            return GazeLabel::NotDetected;
        };

        let left = eye_ratio(landmarks, LEFT_EYE_OUTER, LEFT_EYE_INNER, LEFT_IRIS_CENTER);
        let right = eye_ratio(
            landmarks,
            RIGHT_EYE_OUTER,
            RIGHT_EYE_INNER,
            RIGHT_IRIS_CENTER,
        );

        let (Some(left), Some(right)) = (left, right) else {
            return GazeLabel::NotDetected;
        };

        let avg = (left + right) / 2.0;

        if avg < self.config.left_cutoff {
            GazeLabel::Left
        } else if avg > self.config.right_cutoff {
            GazeLabel::Right
        } else {
            GazeLabel::Center
        }
    }
}

/// Horizontal iris position within the eye span: 0 at the outer corner,
/// 1 at the inner corner. Degenerate spans (corner landmarks collapsed onto
/// the same x) yield `None` rather than a division blowup.
fn eye_ratio(landmarks: &LandmarkSet, outer: usize, inner: usize, center: usize) -> Option<f64> {
    let outer = landmarks.get(outer)?;
    let inner = landmarks.get(inner)?;
    let center = landmarks.get(center)?;

    let span = inner.x - outer.x;
    if span.abs() < f64::EPSILON {
        return None;
    }

    Some((center.x - outer.x) / span)
}
