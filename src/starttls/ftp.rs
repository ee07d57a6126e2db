//! FTP explicit TLS (RFC 4217).

use tokio::io::{AsyncBufRead, AsyncWrite};

use super::session::Session;
use crate::error_handling::ProtocolError;

pub(super) async fn negotiate<S>(session: &mut Session<'_, S>) -> Result<(), ProtocolError>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    // Welcome banner, possibly multi-line (220-...)
    session.read_reply().await?;

    session.send_line("AUTH TLS").await?;
    let line = session.read_line().await?;
    let reply = line.trim_end();
    if !reply.starts_with('2') {
        return Err(session.error(format!("AUTH TLS rejected: {reply}")));
    }
    Ok(())
}
