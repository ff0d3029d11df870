//! Emitter client
//!
//! Streams framed log records into the distributor's emitter port. The
//! emitter direction has no backchannel, so this is write-only.

use ferry_protocol::Message;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use crate::ClientError;

/// Write-only client for the emitter port
///
/// # Example
///
/// ```ignore
/// let mut client = EmitterClient::connect("127.0.0.1:8080").await?;
/// client.send(1, b"payload").await?;
/// client.flush().await?;
/// client.close().await?;
/// ```
pub struct EmitterClient {
    writer: BufWriter<TcpStream>,
}

impl EmitterClient {
    /// Connect to a distributor's emitter port
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ClientError::Connect {
                addr: addr.to_string(),
                source: e,
            })?;

        Ok(Self {
            writer: BufWriter::new(stream),
        })
    }

    /// Frame and send one log record
    pub async fn send(&mut self, severity: u8, payload: &[u8]) -> Result<(), ClientError> {
        let msg = Message::build(severity, payload);
        self.writer.write_all(msg.as_bytes()).await?;
        Ok(())
    }

    /// Send a pre-built message
    pub async fn send_message(&mut self, msg: &Message) -> Result<(), ClientError> {
        self.writer.write_all(msg.as_bytes()).await?;
        Ok(())
    }

    /// Send raw bytes without framing (for protocol-error tests)
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.writer.write_all(bytes).await?;
        Ok(())
    }

    /// Flush the write buffer
    pub async fn flush(&mut self) -> Result<(), ClientError> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Flush and shut the connection down gracefully
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.writer.flush().await?;
        self.writer.get_mut().shutdown().await?;
        Ok(())
    }
}
