//! IMAP STARTTLS (RFC 3501 section 6.2.1).

use tokio::io::{AsyncBufRead, AsyncWrite};

use super::session::{is_continuation, Session};
use crate::error_handling::ProtocolError;

const CAPABILITY_TAG: &str = "a001";
const STARTTLS_TAG: &str = "a002";

/// Untagged data (`* CAPABILITY ...`) always precedes the tagged completion.
fn continues(line: &str) -> bool {
    is_continuation(line) || line.starts_with("* ")
}

pub(super) async fn negotiate<S>(session: &mut Session<'_, S>) -> Result<(), ProtocolError>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    session.read_line().await?;

    session
        .send_line(&format!("{CAPABILITY_TAG} CAPABILITY"))
        .await?;
    // Untagged lines extend the plain fourth-character rule so the group
    // ends at the tagged completion line
    let capabilities = session.read_reply_with(continues).await?;
    if !capabilities.iter().any(|line| line.contains("STARTTLS")) {
        return Err(session.error("server does not offer STARTTLS"));
    }

    session
        .send_line(&format!("{STARTTLS_TAG} STARTTLS"))
        .await?;
    session.read_reply_with(continues).await?;
    Ok(())
}
