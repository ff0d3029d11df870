//! Analyzer client
//!
//! Registers with the distributor's analyzer port (the first four bytes on
//! the wire are the weight handshake), then reads forwarded frames and sends
//! cumulative ACKs and weight updates back on the same socket.

use bytes::BytesMut;
use ferry_protocol::{ControlWord, FrameDecoder, Message};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::ClientError;

/// Client for the analyzer port
///
/// # Example
///
/// ```ignore
/// let mut client = AnalyzerClient::connect("127.0.0.1:8081", 0.5).await?;
/// let mut seen = 0u32;
/// while let Some(msg) = client.recv().await? {
///     seen += 1;
///     client.ack(seen).await?;
/// }
/// ```
pub struct AnalyzerClient {
    stream: TcpStream,
    decoder: FrameDecoder,
    buf: BytesMut,
}

impl AnalyzerClient {
    /// Connect and register with the given weight
    ///
    /// The weight must be finite and non-negative or the distributor closes
    /// the socket without registering.
    pub async fn connect(addr: &str, weight: f32) -> Result<Self, ClientError> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ClientError::Connect {
                addr: addr.to_string(),
                source: e,
            })?;
        stream.set_nodelay(true)?;

        stream
            .write_all(&ControlWord::Weight(weight).encode())
            .await?;

        Ok(Self {
            stream,
            decoder: FrameDecoder::default(),
            buf: BytesMut::with_capacity(64 * 1024),
        })
    }

    /// Receive the next forwarded frame
    ///
    /// Returns `Ok(None)` on a clean EOF (distributor closed the session).
    pub async fn recv(&mut self) -> Result<Option<Message>, ClientError> {
        loop {
            if let Some(msg) = self.decoder.decode(&mut self.buf)? {
                return Ok(Some(msg));
            }
            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                self.decoder.finish(&self.buf)?;
                return Ok(None);
            }
        }
    }

    /// Send a cumulative ACK: everything up to and including `seq` is consumed
    pub async fn ack(&mut self, seq: u32) -> Result<(), ClientError> {
        self.stream
            .write_all(&ControlWord::Ack(seq).encode())
            .await?;
        Ok(())
    }

    /// Send a weight update
    pub async fn update_weight(&mut self, weight: f32) -> Result<(), ClientError> {
        self.stream
            .write_all(&ControlWord::Weight(weight).encode())
            .await?;
        Ok(())
    }

    /// Send raw bytes on the control channel (for protocol-error tests)
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    /// Shut the connection down gracefully
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
