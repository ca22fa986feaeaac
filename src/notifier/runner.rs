use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::engine::NotifierEngine;
use crate::listener::{Listener, ListenerError};
use crate::tracker::SondeFrame;

/// Drives the engine from incoming frames and the check interval.
pub struct Runner {
    pub engine: NotifierEngine,
    pub listener: Listener,
    pub check_interval: Duration,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start listener: {0}")]
    Listener(#[from] ListenerError),
    #[error("listener stopped unexpectedly")]
    ListenerClosed,
}

type RunnerResult<T> = Result<T, RunnerError>;

impl Runner {
    pub async fn run(mut self) -> RunnerResult<()> {
        let (frames_tx, mut frames_rx) = mpsc::unbounded_channel();
        self.listener.start(frames_tx).await?;

        log::info!("Running notifier");

        let result = drive(
            &mut self.engine,
            &mut frames_rx,
            self.check_interval,
            tokio::signal::ctrl_c(),
        )
        .await;

        self.listener.stop().await;
        result
    }
}

/// Feed frames to the engine as they arrive and tick it every
/// `check_interval`, starting one interval from now, until `shutdown`
/// resolves or the frame channel closes.
async fn drive(
    engine: &mut NotifierEngine,
    frames: &mut mpsc::UnboundedReceiver<SondeFrame>,
    check_interval: Duration,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> RunnerResult<()> {
    let mut ticks = interval_at(Instant::now() + check_interval, check_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(frame) => engine.ingest(frame),
                None => return Err(RunnerError::ListenerClosed),
            },
            _ = ticks.tick() => {
                let tick = AssertUnwindSafe(engine.tick(Utc::now()));
                if let Err(panic) = tick.catch_unwind().await {
                    log::error!("Notification check panicked: {}", panic_message(&*panic));
                }
            }
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    log::error!("Failed to listen for shutdown signal: {}", e);
                }
                log::info!("Caught shutdown signal, shutting down");
                return Ok(());
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown cause"
    }
}
