use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::debug;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::state::SessionState;

/// Owns the periodic focus sampler task. Started once per session and
/// stopped synchronously at session end, so no tick can land after the
/// summary snapshot is taken.
pub(crate) struct SamplerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(&mut self, state: Arc<Mutex<SessionState>>, interval_ms: u64) -> Result<()> {
        if self.handle.is_some() {
            bail!("sampler already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(sampler_loop(state, interval_ms, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancel the loop and wait for it to wind down. Idempotent.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampler task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

/// Fixed-interval timeline recorder. The first sample lands one full
/// interval after start; a tick that arrives late is delayed rather than
/// bursted so the timeline never double-counts.
async fn sampler_loop(
    state: Arc<Mutex<SessionState>>,
    interval_ms: u64,
    cancel_token: CancellationToken,
) {
    let period = Duration::from_millis(interval_ms);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut guard = state.lock().await;
                guard.append_sample();
            }
            _ = cancel_token.cancelled() => {
                debug!("sampler loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::FocusConfig;
    use crate::playback::SessionMode;
    use crate::session::summary::{LectureInfo, UserInfo};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn running_state() -> Arc<Mutex<SessionState>> {
        let mut state = SessionState::new(FocusConfig::default());
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
        Arc::new(Mutex::new(state))
    }

    #[tokio::test(start_paused = true)]
    async fn samples_land_once_per_interval() {
        let state = running_state();
        let mut sampler = SamplerController::new();
        sampler.start(state.clone(), 3000).unwrap();

        tokio::time::sleep(Duration::from_millis(9100)).await;
        sampler.stop().await.unwrap();

        assert_eq!(state.lock().await.focus_samples.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_sample_waits_a_full_interval() {
        let state = running_state();
        let mut sampler = SamplerController::new();
        sampler.start(state.clone(), 3000).unwrap();

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(state.lock().await.focus_samples.len(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        sampler.stop().await.unwrap();
        assert_eq!(state.lock().await.focus_samples.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn frozen_ticks_leave_no_trace() {
        let state = running_state();
        let mut sampler = SamplerController::new();
        sampler.start(state.clone(), 3000).unwrap();

        tokio::time::sleep(Duration::from_millis(3100)).await;
        state.lock().await.frozen = true;
        tokio::time::sleep(Duration::from_millis(6000)).await;
        state.lock().await.frozen = false;
        tokio::time::sleep(Duration::from_millis(3000)).await;
        sampler.stop().await.unwrap();

        // One sample before the freeze, one after, nothing in between.
        assert_eq!(state.lock().await.focus_samples.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn no_sample_lands_after_stop() {
        let state = running_state();
        let mut sampler = SamplerController::new();
        sampler.start(state.clone(), 3000).unwrap();

        tokio::time::sleep(Duration::from_millis(3100)).await;
        sampler.stop().await.unwrap();
        let count = state.lock().await.focus_samples.len();

        tokio::time::sleep(Duration::from_millis(30_000)).await;
        assert_eq!(state.lock().await.focus_samples.len(), count);
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let state = running_state();
        let mut sampler = SamplerController::new();
        sampler.start(state.clone(), 3000).unwrap();
        assert!(sampler.start(state, 3000).is_err());
        sampler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let mut sampler = SamplerController::new();
        sampler.stop().await.unwrap();
    }
}
