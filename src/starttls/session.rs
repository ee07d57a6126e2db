//! Plaintext wire I/O shared by the negotiators.
//!
//! Every read and write is bounded by the run's timeout. Failures of any kind
//! become a [`ProtocolError`] for the protocol being negotiated.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::StartTls;
use crate::config::{MAX_REPLY_BYTES, MAX_REPLY_LINES};
use crate::error_handling::ProtocolError;

/// Returns `true` when another line of the same reply follows.
///
/// A reply line is the last of its group unless its fourth character is a
/// dash (`250-STARTTLS`). Lines shorter than four characters end the group.
pub(crate) fn is_continuation(line: &str) -> bool {
    line.as_bytes().get(3) == Some(&b'-')
}

pub(crate) struct Session<'a, S> {
    stream: &'a mut S,
    protocol: StartTls,
    timeout: Duration,
}

impl<'a, S> Session<'a, S>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: &'a mut S, protocol: StartTls, timeout: Duration) -> Self {
        Self {
            stream,
            protocol,
            timeout,
        }
    }

    pub(crate) fn error(&self, cause: impl Into<String>) -> ProtocolError {
        ProtocolError::new(self.protocol, cause)
    }

    pub(crate) async fn send(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        log::trace!("{} >> {}", self.protocol, String::from_utf8_lossy(data).trim_end());
        let stream = &mut *self.stream;
        let write = async move {
            stream.write_all(data).await?;
            stream.flush().await
        };
        bounded(self.protocol, self.timeout, "send failed", write).await
    }

    pub(crate) async fn send_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        self.send(format!("{line}\r\n").as_bytes()).await
    }

    /// Reads one line, without its line terminator.
    pub(crate) async fn read_line(&mut self) -> Result<String, ProtocolError> {
        let mut buf = Vec::new();
        let stream = &mut *self.stream;
        let read = async {
            let mut limited = stream.take(MAX_REPLY_BYTES as u64);
            limited.read_until(b'\n', &mut buf).await
        };
        let n = bounded(self.protocol, self.timeout, "reading server reply", read).await?;
        if n == 0 {
            return Err(self.error("connection closed by server"));
        }
        let line = String::from_utf8_lossy(&buf)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        log::trace!("{} << {}", self.protocol, line);
        Ok(line)
    }

    /// Reads a reply group whose lines continue while `continues` holds.
    pub(crate) async fn read_reply_with(
        &mut self,
        continues: fn(&str) -> bool,
    ) -> Result<Vec<String>, ProtocolError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            let more = continues(&line);
            lines.push(line);
            if !more {
                return Ok(lines);
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(self.error(format!("reply exceeds {MAX_REPLY_LINES} lines")));
            }
        }
    }

    /// Reads a multi-line reply using the fourth-character continuation rule.
    pub(crate) async fn read_reply(&mut self) -> Result<Vec<String>, ProtocolError> {
        self.read_reply_with(is_continuation).await
    }

    /// Reads raw text until one of `markers` appears or the server closes.
    pub(crate) async fn read_until_any(
        &mut self,
        markers: &[&str],
    ) -> Result<String, ProtocolError> {
        self.read_until(|text| markers.iter().any(|marker| text.contains(marker)))
            .await
    }

    /// Reads raw text until `done` accepts everything read so far or the
    /// server closes.
    pub(crate) async fn read_until(
        &mut self,
        done: impl Fn(&str) -> bool,
    ) -> Result<String, ProtocolError> {
        let mut text = String::new();
        loop {
            let stream = &mut *self.stream;
            let read = async {
                let buf = stream.fill_buf().await?;
                let chunk = buf.to_vec();
                stream.consume(chunk.len());
                Ok::<_, std::io::Error>(chunk)
            };
            let chunk = bounded(self.protocol, self.timeout, "reading server reply", read).await?;
            if chunk.is_empty() {
                break;
            }
            text.push_str(&String::from_utf8_lossy(&chunk));
            if done(&text) {
                break;
            }
            if text.len() > MAX_REPLY_BYTES {
                return Err(self.error(format!("reply exceeds {MAX_REPLY_BYTES} bytes")));
            }
        }
        log::trace!("{} << {}", self.protocol, text.trim_end());
        Ok(text)
    }

    pub(crate) async fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        let mut word = [0u8; 4];
        let stream = &mut *self.stream;
        bounded(
            self.protocol,
            self.timeout,
            "reading 4-byte reply",
            stream.read_exact(&mut word),
        )
        .await?;
        Ok(u32::from_be_bytes(word))
    }
}

async fn bounded<T, F>(
    protocol: StartTls,
    timeout: Duration,
    what: &str,
    fut: F,
) -> Result<T, ProtocolError>
where
    F: Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ProtocolError::new(protocol, format!("{what}: {e}"))),
        Err(_) => Err(ProtocolError::new(
            protocol,
            format!("{what}: timed out after {}s", timeout.as_secs()),
        )),
    }
}
