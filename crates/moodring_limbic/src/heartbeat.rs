//! Heartbeat driver for the mood engine
//!
//! The engine never schedules itself. This driver moves it into one tokio
//! task that ticks it on an interval and applies stimuli as they arrive, so
//! steps and stimuli are serialized without a lock. Snapshots flow out through
//! the engine's watch channel.

use crate::engine::MoodEngine;
use crate::snapshot::MoodSnapshot;
use moodring_core::{AppliedStimulus, HeartbeatSettings, MoodError};
use rand::Rng;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Configuration for the mood heartbeat
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// How often to step the engine (default: 1s)
    pub interval: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        HeartbeatSettings::default().into()
    }
}

impl From<HeartbeatSettings> for HeartbeatConfig {
    fn from(settings: HeartbeatSettings) -> Self {
        Self {
            interval: Duration::from_millis(settings.interval_ms.max(1)),
        }
    }
}

impl HeartbeatConfig {
    /// Fast heartbeat for lively displays
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_millis(250),
        }
    }

    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            interval: Duration::from_millis(5),
        }
    }
}

struct StimulusRequest {
    id: String,
    reply: oneshot::Sender<Result<AppliedStimulus, MoodError>>,
}

/// Handle to a running heartbeat task.
pub struct MoodHeartbeat {
    stimulus_tx: mpsc::Sender<StimulusRequest>,
    snapshot_rx: watch::Receiver<MoodSnapshot>,
    handle: JoinHandle<()>,
}

impl MoodHeartbeat {
    /// Move `engine` into a background task and start ticking.
    pub fn spawn<R>(engine: MoodEngine<R>, config: HeartbeatConfig) -> Self
    where
        R: Rng + Send + 'static,
    {
        let (stimulus_tx, stimulus_rx) = mpsc::channel(64);
        let snapshot_rx = engine.subscribe();
        let handle = tokio::spawn(run(engine, stimulus_rx, config.interval));

        Self {
            stimulus_tx,
            snapshot_rx,
            handle,
        }
    }

    /// Apply a stimulus on the heartbeat task and wait for the result. A
    /// `MoodError` (e.g. unknown id) comes back as the error's source.
    pub async fn apply_stimulus(&self, id: &str) -> anyhow::Result<AppliedStimulus> {
        let (reply, rx) = oneshot::channel();
        self.stimulus_tx
            .send(StimulusRequest {
                id: id.to_string(),
                reply,
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send stimulus: {}", e))?;
        let applied = rx
            .await
            .map_err(|_| anyhow::anyhow!("Mood heartbeat stopped before replying"))??;
        Ok(applied)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> MoodSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MoodSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop ticking. The engine is dropped with the task.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for MoodHeartbeat {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run<R: Rng>(
    mut engine: MoodEngine<R>,
    mut stimulus_rx: mpsc::Receiver<StimulusRequest>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = engine.step() {
                    tracing::error!("Mood heartbeat stopping: {}", e);
                    break;
                }
            }

            request = stimulus_rx.recv() => {
                let Some(request) = request else {
                    tracing::debug!("Stimulus channel closed, stopping mood heartbeat");
                    break;
                };
                let result = engine.apply_stimulus(&request.id);
                if let Err(e) = &result {
                    tracing::debug!("Stimulus '{}' rejected: {}", request.id, e);
                }
                let _ = request.reply.send(result);
            }
        }
    }
}
