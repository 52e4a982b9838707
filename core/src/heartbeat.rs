//! Periodic presence heartbeat.
//!
//! # Design
//! `spawn_heartbeat` runs `LobbyClient::heartbeat` on a tokio task, once
//! immediately and then every `interval`. A failed beat is logged and the
//! loop keeps going; only `max_consecutive_failures` (opt-in) ends it with
//! the last error. The task stops when the `HeartbeatHandle` is stopped or
//! dropped, including while a beat is in flight.

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::auth::Credential;
use crate::error::ApiResult;
use crate::session::LobbyClient;
use crate::transport::Transport;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    /// Give up after this many failures in a row. `None` never gives up.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            max_consecutive_failures: None,
        }
    }
}

impl HeartbeatConfig {
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = Some(max);
        self
    }
}

/// Owner of a running heartbeat task. Dropping it stops the task.
#[derive(Debug)]
pub struct HeartbeatHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<ApiResult<()>>,
}

impl HeartbeatHandle {
    /// Stop the heartbeat and wait for the task to wind down.
    ///
    /// Returns the error that ended the task if it had already given up.
    pub async fn stop(self) -> ApiResult<()> {
        let HeartbeatHandle { stop, task } = self;
        // The task may have exited on its own already.
        let _ = stop.send(());
        finish(task).await
    }

    /// Wait until the task ends by itself, i.e. after giving up.
    pub async fn join(self) -> ApiResult<()> {
        let HeartbeatHandle { stop, task } = self;
        let result = finish(task).await;
        drop(stop);
        result
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn finish(task: JoinHandle<ApiResult<()>>) -> ApiResult<()> {
    match task.await {
        Ok(result) => result,
        Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
        Err(_) => Ok(()),
    }
}

/// Start sending heartbeats for `client`'s user.
pub fn spawn_heartbeat<T, C>(client: Arc<LobbyClient<T, C>>, config: HeartbeatConfig) -> HeartbeatHandle
where
    T: Transport + Send + Sync + 'static,
    C: Credential + Send + Sync + 'static,
{
    let (stop, mut stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let mut ticker = time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                _ = &mut stopped => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = &mut stopped => break,
                result = client.heartbeat() => result,
            };

            match result {
                Ok(()) => failures = 0,
                Err(err) => {
                    failures = failures.saturating_add(1);
                    warn!(error = %err, consecutive_failures = failures, "heartbeat failed");
                    if config.max_consecutive_failures.is_some_and(|max| failures >= max) {
                        return Err(err);
                    }
                }
            }
        }

        debug!("heartbeat stopped");
        Ok(())
    });

    HeartbeatHandle { stop, task }
}
