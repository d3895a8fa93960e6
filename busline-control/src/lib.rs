//! Line-oriented authenticated control-port command channel

mod error;
mod response;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

pub use self::error::ControlError;
pub use self::response::{Response, ResponseStatus};

/// An authenticated, line-oriented command channel over a TCP control port
///
/// `Authenticate` must succeed before any other command is accepted;
/// `Close` is idempotent and safe to call after an error.
pub struct ControlChannel {
    reader: Option<BufReader<OwnedReadHalf>>,
    writer: Option<BufWriter<OwnedWriteHalf>>,
    authenticated: bool,
}

impl ControlChannel {
    /// Dial `addr`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Timeout`] if the dial doesn't complete in
    /// time, or [`ControlError::Io`] if it fails outright.
    pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self, ControlError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ControlError::Timeout)?
            .map_err(ControlError::Io)?;

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: Some(BufReader::new(read_half)),
            writer: Some(BufWriter::new(write_half)),
            authenticated: false,
        })
    }

    /// Authenticate with `password`.
    ///
    /// Sends `AUTHENTICATE "<password>"\n` and requires a `250` response.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Rejected`] if the server declines, or a
    /// transport error.
    pub async fn authenticate(&mut self, password: &str) -> Result<(), ControlError> {
        self.send_command(&format!("AUTHENTICATE \"{password}\"\n"))
            .await?;
        let response = self.read_response().await?;
        if response.status == ResponseStatus::Ok {
            self.authenticated = true;
            Ok(())
        } else {
            Err(ControlError::Rejected(response))
        }
    }

    /// Send a named signal.
    ///
    /// Sends `SIGNAL <name>\r\n` and requires a `250` response. Must be
    /// called after a successful [`authenticate`](Self::authenticate).
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NotAuthenticated`] if called before
    /// authenticating, [`ControlError::Rejected`] if the server declines,
    /// or a transport error.
    pub async fn signal(&mut self, name: &str) -> Result<(), ControlError> {
        if !self.authenticated {
            return Err(ControlError::NotAuthenticated);
        }
        self.send_command(&format!("SIGNAL {name}\r\n")).await?;
        let response = self.read_response().await?;
        if response.status == ResponseStatus::Ok {
            Ok(())
        } else {
            Err(ControlError::Rejected(response))
        }
    }

    /// Write `text` verbatim and flush it.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Closed`] if the channel was already closed,
    /// or [`ControlError::Io`] on a write/flush failure.
    pub async fn send_command(&mut self, text: &str) -> Result<(), ControlError> {
        let writer = self.writer.as_mut().ok_or(ControlError::Closed)?;
        writer
            .write_all(text.as_bytes())
            .await
            .map_err(ControlError::Io)?;
        writer.flush().await.map_err(ControlError::Io)?;
        Ok(())
    }

    /// Read and parse a single response line.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Closed`] if the channel was already closed,
    /// [`ControlError::ConnectionClosed`] on EOF, or
    /// [`ControlError::MalformedResponse`] if the line can't be parsed.
    pub async fn read_response(&mut self) -> Result<Response, ControlError> {
        let reader = self.reader.as_mut().ok_or(ControlError::Closed)?;
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await.map_err(ControlError::Io)?;
        if bytes_read == 0 {
            return Err(ControlError::ConnectionClosed);
        }
        response::parse_response(&line)
    }

    /// Tear down the channel.
    ///
    /// Idempotent: calling it more than once is a no-op.
    pub fn close(&mut self) {
        self.reader = None;
        self.writer = None;
        self.authenticated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{ControlChannel, ControlError};
    use claims::assert_matches;

    #[tokio::test]
    async fn signal_before_authenticate_is_rejected() {
        let mut channel = ControlChannel {
            reader: None,
            writer: None,
            authenticated: false,
        };
        assert_matches!(
            channel.signal("RELOAD").await,
            Err(ControlError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn closed_channel_rejects_commands() {
        let mut channel = ControlChannel {
            reader: None,
            writer: None,
            authenticated: false,
        };
        channel.close();
        assert_matches!(
            channel.send_command("PING\n").await,
            Err(ControlError::Closed)
        );
    }
}
