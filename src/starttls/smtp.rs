//! SMTP STARTTLS (RFC 3207).

use tokio::io::{AsyncBufRead, AsyncWrite};

use super::session::Session;
use crate::error_handling::ProtocolError;

pub(super) async fn negotiate<S>(
    session: &mut Session<'_, S>,
    client_name: &str,
) -> Result<(), ProtocolError>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    session.read_reply().await?;

    session.send_line(&format!("EHLO {client_name}")).await?;
    let capabilities = session.read_reply().await?;
    if !capabilities.iter().any(|line| line.contains("STARTTLS")) {
        return Err(session.error("server does not offer STARTTLS"));
    }

    session.send_line("STARTTLS").await?;
    session.read_reply().await?;
    Ok(())
}
