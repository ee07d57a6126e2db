//! Quassel core protocol handshake.
//!
//! The client sends two big-endian words: the magic number with the
//! requested features, then the supported protocol list terminated by the
//! end-of-list bit. The core answers with one word carrying the chosen
//! protocol in the low byte and its feature flags in the top byte.

use tokio::io::{AsyncBufRead, AsyncWrite};

use super::session::Session;
use crate::error_handling::ProtocolError;

const MAGIC: u32 = 0x42b3_3f00;
const FEATURE_ENCRYPTION: u32 = 0x01;
const PROTOCOL_DATAGRAM: u32 = 0x02;
const END_OF_LIST: u32 = 0x01 << 31;

pub(super) async fn negotiate<S>(session: &mut Session<'_, S>) -> Result<(), ProtocolError>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    let mut hello = [0u8; 8];
    hello[..4].copy_from_slice(&(MAGIC | FEATURE_ENCRYPTION).to_be_bytes());
    hello[4..].copy_from_slice(&(PROTOCOL_DATAGRAM | END_OF_LIST).to_be_bytes());
    session.send(&hello).await?;

    let reply = session.read_u32().await?;
    log::debug!("Quassel core replied {reply:#010x}");
    let protocol = reply & 0xff;
    let features = reply >> 24;
    if protocol & PROTOCOL_DATAGRAM == 0 {
        return Err(session.error(format!(
            "core does not support the datagram protocol (reply {reply:#010x})"
        )));
    }
    if features & FEATURE_ENCRYPTION == 0 {
        return Err(session.error(format!(
            "core does not support encryption (reply {reply:#010x})"
        )));
    }
    Ok(())
}
