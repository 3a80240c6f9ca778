use anyhow::{bail, Context, Result};
use log::debug;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::gaze::LandmarkSet;

use super::controller::SessionController;

/// A frame from the landmark provider: a detected face's landmark set, or
/// `None` when no face was found in the frame.
pub type LandmarkFrame = Option<LandmarkSet>;

/// Subscription to a landmark provider. Frames arrive on a channel at the
/// provider's own cadence and are forwarded into the controller until the
/// provider hangs up or the session ends.
pub(crate) struct FrameFeed {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl FrameFeed {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(
        &mut self,
        controller: SessionController,
        frames: UnboundedReceiver<LandmarkFrame>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("frame feed already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(feed_loop(controller, frames, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Detach from the provider and wait for the loop to wind down.
    /// Idempotent.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("frame feed task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

async fn feed_loop(
    controller: SessionController,
    mut frames: UnboundedReceiver<LandmarkFrame>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Some(frame) => controller.ingest_frame(frame.as_ref()).await,
                    None => {
                        debug!("landmark provider hung up");
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                debug!("frame feed shutting down");
                break;
            }
        }
    }
}
