use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lecture metadata captured at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureInfo {
    pub title: String,
    pub video_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub name: String,
    pub profile: String,
}

/// One sampler bucket of the focus timeline. `percent_not_focused` is binary
/// (0 or 100) because each bucket holds a single coarse sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FocusInterval {
    /// Label in elapsed seconds, e.g. `"3-6"`.
    pub interval: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub percent_not_focused: u8,
}

/// Unfocused share for one quarter of the session, `None` when the quarter
/// holds no intervals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuartileBreakdown {
    pub range: String,
    pub unfocused_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureSummary {
    pub title: String,
    pub duration_minutes: i64,
    pub start_time: DateTime<Utc>,
}

/// Immutable end-of-session report built from the sampled focus timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub lecture: LectureSummary,
    pub user: UserInfo,
    pub focus_intervals: Vec<FocusInterval>,
    pub total_unfocused_ms: u64,
    /// Share of intervals spent focused, 0 when nothing was sampled.
    pub focus_percent: f64,
    pub quartiles: Vec<QuartileBreakdown>,
}

impl SessionSummary {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

const QUARTILE_RANGES: [&str; 4] = ["0-25%", "25-50%", "50-75%", "75-100%"];

/// Partition the sample sequence into fixed-width buckets and aggregate.
/// Tolerates an empty sequence: totals come out zero, quartiles empty.
pub(crate) fn build_summary(
    session_id: String,
    lecture: LectureInfo,
    user: UserInfo,
    samples: &[u8],
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    interval_ms: u64,
) -> SessionSummary {
    let interval_secs = interval_ms / 1000;

    let focus_intervals: Vec<FocusInterval> = samples
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let offset = |ticks: u64| Duration::milliseconds((ticks * interval_ms) as i64);
            FocusInterval {
                interval: format!(
                    "{}-{}",
                    index as u64 * interval_secs,
                    (index as u64 + 1) * interval_secs
                ),
                start_time: started_at + offset(index as u64),
                end_time: started_at + offset(index as u64 + 1),
                percent_not_focused: if *sample == 1 { 0 } else { 100 },
            }
        })
        .collect();

    let unfocused_count = samples.iter().filter(|s| **s == 0).count() as u64;
    let total_unfocused_ms = unfocused_count * interval_ms;

    let focus_percent = if samples.is_empty() {
        0.0
    } else {
        let focused = samples.len() as u64 - unfocused_count;
        focused as f64 / samples.len() as f64 * 100.0
    };

    SessionSummary {
        session_id,
        lecture: LectureSummary {
            title: lecture.title,
            duration_minutes: (ended_at - started_at).num_minutes(),
            start_time: started_at,
        },
        user,
        focus_intervals,
        total_unfocused_ms,
        focus_percent,
        quartiles: quartile_breakdown(samples),
    }
}

/// Split intervals into session quarters and report the unfocused share of
/// each, mirroring the end-of-session chart.
fn quartile_breakdown(samples: &[u8]) -> Vec<QuartileBreakdown> {
    let mut buckets: [(u64, u64); 4] = [(0, 0); 4];
    let total = samples.len();

    for (index, sample) in samples.iter().enumerate() {
        let quartile = (index * 4 / total).min(3);
        buckets[quartile].0 += 1;
        if *sample == 0 {
            buckets[quartile].1 += 1;
        }
    }

    QUARTILE_RANGES
        .iter()
        .zip(buckets)
        .map(|(range, (count, unfocused))| QuartileBreakdown {
            range: range.to_string(),
            unfocused_percent: if count == 0 {
                None
            } else {
                Some(unfocused as f64 / count as f64 * 100.0)
            },
        })
        .collect()
}
