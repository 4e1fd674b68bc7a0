//! # Channel Server
//!
//! Exclusive owner of the command socket. Each connection carries one
//! command: read until EOF (or the read timeout), forward the command into
//! the app's event queue, write the acknowledgement, close.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::app::AppEvent;
use crate::channel::protocol::Command;
use crate::constants::{
    CHANNEL_ACK, CHANNEL_CLIENT_TIMEOUT_MS, CHANNEL_READ_TIMEOUT_MS, MAX_COMMAND_BYTES,
};
use crate::error::{PandaError, Result};

/// Bound command channel. Removes its socket file when dropped.
pub struct ChannelServer {
    listener: UnixListener,
    path: PathBuf,
}

impl ChannelServer {
    /// Claim the channel at `path`.
    ///
    /// Fails with [`PandaError::ChannelBind`] if a live instance answers on
    /// the path. A socket file nobody is listening on is left over from a
    /// crash and is replaced.
    pub async fn bind(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match UnixListener::bind(path) {
            Ok(listener) => return Ok(Self::bound(listener, path)),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {}
            Err(e) => return Err(e.into()),
        }

        if Self::is_live(path).await {
            return Err(PandaError::ChannelBind(path.to_path_buf()));
        }

        warn!("Removing stale channel socket {}", path.display());
        std::fs::remove_file(path)?;
        let listener = UnixListener::bind(path)?;
        Ok(Self::bound(listener, path))
    }

    fn bound(listener: UnixListener, path: &Path) -> Self {
        info!("Command channel listening on {}", path.display());
        Self {
            listener,
            path: path.to_path_buf(),
        }
    }

    /// Whether something accepts connections on `path`.
    async fn is_live(path: &Path) -> bool {
        let wait = Duration::from_millis(CHANNEL_CLIENT_TIMEOUT_MS);
        matches!(timeout(wait, UnixStream::connect(path)).await, Ok(Ok(_)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the accept loop in a background task, forwarding commands to `events`.
    pub fn spawn(self, events: mpsc::UnboundedSender<AppEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.listener.accept().await {
                    Ok((stream, _addr)) => {
                        let events = events.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, events).await {
                                debug!("Channel connection ended: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept channel connection: {}", e);
                    }
                }
            }
        })
    }
}

impl Drop for ChannelServer {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("Could not remove {}: {}", self.path.display(), e);
        }
    }
}

/// Serve a single client: one token in, one acknowledgement out.
async fn handle_connection(
    mut stream: UnixStream,
    events: mpsc::UnboundedSender<AppEvent>,
) -> Result<()> {
    let mut payload = Vec::new();
    let wait = Duration::from_millis(CHANNEL_READ_TIMEOUT_MS);
    let read = timeout(
        wait,
        (&mut stream)
            .take(MAX_COMMAND_BYTES)
            .read_to_end(&mut payload),
    )
    .await;
    match read {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return Err(e.into()),
        // Sender never closed its half; use whatever arrived.
        Err(_) => debug!("Channel read timed out after {} bytes", payload.len()),
    }

    match Command::from_payload(&payload) {
        Ok(command) => {
            info!("Channel command: {}", command);
            if events.send(AppEvent::Command(command)).is_err() {
                warn!("App loop is gone; dropping {}", command);
            }
        }
        Err(e) => debug!("Ignoring channel payload: {}", e),
    }

    stream.write_all(CHANNEL_ACK).await?;
    stream.shutdown().await?;
    Ok(())
}
