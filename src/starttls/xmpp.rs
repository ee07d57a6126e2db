//! XMPP STARTTLS (RFC 6120 section 5).

use std::sync::LazyLock;

use regex::Regex;
use tokio::io::{AsyncBufRead, AsyncWrite};

use super::session::Session;
use crate::error_handling::ProtocolError;

const TLS_NAMESPACE: &str = "urn:ietf:params:xml:ns:xmpp-tls";

static STARTTLS_FEATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<starttls\b[^>]*\bxmlns\s*=\s*['"]urn:ietf:params:xml:ns:xmpp-tls['"]"#)
        .expect("STARTTLS feature pattern is valid")
});

/// The `<proceed/>` element has been read in full, or the server refused.
fn proceed_answered(text: &str) -> bool {
    if text.contains("<failure") {
        return true;
    }
    text.find("<proceed").is_some_and(|start| {
        let element = &text[start..];
        element.contains("/>") || element.contains("</proceed>")
    })
}

fn stream_header(domain: &str) -> String {
    format!(
        "<?xml version='1.0'?><stream:stream to='{domain}' xmlns='jabber:client' \
         xmlns:stream='http://etherx.jabber.org/streams' version='1.0'>"
    )
}

pub(super) async fn negotiate<S>(
    session: &mut Session<'_, S>,
    domain: &str,
) -> Result<(), ProtocolError>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    session.send(stream_header(domain).as_bytes()).await?;
    let features = session
        .read_until_any(&["</stream:features>", "</features>", "<stream:error"])
        .await?;
    if !STARTTLS_FEATURE.is_match(&features) {
        return Err(session.error("server does not offer STARTTLS"));
    }

    session
        .send(format!("<starttls xmlns='{TLS_NAMESPACE}'/>").as_bytes())
        .await?;
    let reply = session.read_until(proceed_answered).await?;
    if !reply.contains("<proceed") {
        return Err(session.error(format!("server refused STARTTLS: {}", reply.trim())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starttls_feature_requires_tls_namespace() {
        assert!(STARTTLS_FEATURE.is_match(
            "<stream:features><starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'>\
             <required/></starttls></stream:features>"
        ));
        assert!(STARTTLS_FEATURE.is_match(
            r#"<starttls xmlns="urn:ietf:params:xml:ns:xmpp-tls"/>"#
        ));
        assert!(!STARTTLS_FEATURE.is_match("<starttls xmlns='urn:example:other'/>"));
        assert!(!STARTTLS_FEATURE.is_match(
            "<mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>"
        ));
    }

    #[test]
    fn test_proceed_needs_complete_element() {
        assert!(!proceed_answered("<proceed"));
        assert!(!proceed_answered("<proceed xmlns='urn:ietf:params:xml:ns:xmpp-tls'"));
        assert!(proceed_answered("<proceed xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>"));
        assert!(proceed_answered("<proceed xmlns='urn:ietf:params:xml:ns:xmpp-tls'></proceed>"));
        assert!(proceed_answered("<failure xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>"));
        assert!(!proceed_answered(""));
    }

    #[test]
    fn test_stream_header_addresses_domain() {
        let header = stream_header("jabber.example.org");
        assert!(header.starts_with("<?xml version='1.0'?><stream:stream to='jabber.example.org'"));
        assert!(header.ends_with("version='1.0'>"));
    }
}
