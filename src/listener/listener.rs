use chrono::Utc;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::error::ListenerError;
use super::packet::decode_datagram;
use crate::tracker::SondeFrame;

const MAX_DATAGRAM: usize = 4096;

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<Result<(), ListenerError>>,
}

/// Receives AutoRX payload summaries over UDP and forwards them as frames.
pub struct Listener {
    host: String,
    port: u16,
    worker: Option<WorkerHandle>,
}

impl Listener {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            worker: None,
        }
    }

    /// Bind the socket and spawn the receive loop. The loop drops `frames`
    /// when it ends, so the receiving side sees the channel close.
    pub async fn start(
        &mut self,
        frames: mpsc::UnboundedSender<SondeFrame>,
    ) -> Result<SocketAddr, ListenerError> {
        if self.worker.is_some() {
            return Err(ListenerError::AlreadyRunning);
        }

        let socket = UdpSocket::bind((self.host.as_str(), self.port)).await?;
        let local_addr = socket.local_addr()?;
        log::info!("Started AutoRX listener on {}", local_addr);

        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(async move {
            let result = run_listener_loop(socket, frames, stop_rx).await;
            if let Err(e) = &result {
                log::error!("AutoRX listener stopped: {}", e);
            }
            result
        });

        self.worker = Some(WorkerHandle { stop_tx, join });
        Ok(local_addr)
    }

    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
            log::info!("AutoRX listener closed");
        }
    }
}

async fn run_listener_loop(
    socket: UdpSocket,
    frames: mpsc::UnboundedSender<SondeFrame>,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<(), ListenerError> {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        let len = tokio::select! {
            received = socket.recv_from(&mut buf) => received?.0,
            _ = &mut stop_rx => return Ok(()),
        };

        match decode_datagram(&buf[..len], Utc::now()) {
            Ok(Some(frame)) => {
                log::debug!(
                    "Frame {} from {}: {}, {}, {}m",
                    frame.frame_number,
                    frame.serial,
                    frame.latitude,
                    frame.longitude,
                    frame.altitude
                );
                if frames.send(frame).is_err() {
                    // Engine is gone.
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(e) => log::error!("Error while parsing AutoRX UDP payload summary: {}", e),
        }
    }
}
