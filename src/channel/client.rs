//! # Channel Client
//!
//! Used by a second invocation to hand its command to the running instance.

use std::path::Path;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::channel::protocol::Command;
use crate::constants::{CHANNEL_ACK, CHANNEL_CLIENT_TIMEOUT_MS};
use crate::error::{PandaError, Result};

/// Deliver `command` to the instance listening on `path`.
pub async fn send_command(path: &Path, command: Command) -> Result<()> {
    send_token(path, command.token()).await
}

/// Deliver a raw token. The server acknowledges even tokens it ignores.
///
/// Any failure to connect or to receive the acknowledgement within the
/// client timeout is reported as [`PandaError::ChannelTimeout`].
pub async fn send_token(path: &Path, token: &str) -> Result<()> {
    let wait = Duration::from_millis(CHANNEL_CLIENT_TIMEOUT_MS);
    let not_running = || PandaError::ChannelTimeout(path.to_path_buf());

    let mut stream = match timeout(wait, UnixStream::connect(path)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            debug!("Connect to {} failed: {}", path.display(), e);
            return Err(not_running());
        }
        Err(_) => {
            debug!("Connect to {} timed out", path.display());
            return Err(not_running());
        }
    };

    stream.write_all(token.as_bytes()).await?;
    stream.shutdown().await?;

    let mut reply = [0u8; 2];
    match timeout(wait, stream.read_exact(&mut reply)).await {
        Ok(Ok(_)) if &reply == CHANNEL_ACK => Ok(()),
        Ok(Ok(_)) => Err(PandaError::UnexpectedReply(
            String::from_utf8_lossy(&reply).into_owned(),
        )),
        Ok(Err(e)) => {
            debug!("No acknowledgement from {}: {}", path.display(), e);
            Err(not_running())
        }
        Err(_) => Err(not_running()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn wrong_reply_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut sink = Vec::new();
            stream.read_to_end(&mut sink).await.unwrap();
            stream.write_all(b"no").await.unwrap();
            sink
        });

        match send_command(&path, Command::Settings).await {
            Err(PandaError::UnexpectedReply(r)) => assert_eq!(r, "no"),
            other => panic!("expected UnexpectedReply, got {:?}", other),
        }
        assert_eq!(server.await.unwrap(), b"settings".to_vec());
    }

    #[tokio::test]
    async fn server_that_never_replies_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mute.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let started = std::time::Instant::now();
        assert!(matches!(
            send_command(&path, Command::Show).await,
            Err(PandaError::ChannelTimeout(_))
        ));
        assert!(started.elapsed() < Duration::from_secs(3));
        server.abort();
    }
}
