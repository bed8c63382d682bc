//! Async stream framing.
//!
//! The facilitator sends performatives back to back on one TCP stream with
//! no length prefix. Framing scans to the opening `(`, consumes one
//! balanced expression (string-aware, so parens inside quotes don't
//! count), and hands the bytes to the parser.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::parser::{self, KqmlError};
use crate::value::Performative;

/// Read the next performative off `reader`.
///
/// Returns `Ok(None)` on a clean EOF between messages. EOF in the middle
/// of an expression is an [`KqmlError::UnexpectedEof`].
pub async fn read_performative<R>(reader: &mut R) -> Result<Option<Performative>, KqmlError>
where
    R: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    loop {
        let byte = match reader.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                if buf.is_empty() {
                    return Ok(None);
                }
                return Err(KqmlError::UnexpectedEof { pos: buf.len() });
            }
            Err(e) => return Err(KqmlError::Io(e)),
        };

        // Skip inter-message bytes (whitespace, stray newlines).
        if buf.is_empty() && byte != b'(' {
            continue;
        }
        buf.push(byte);

        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let text = String::from_utf8_lossy(&buf);
                    return parser::parse_performative(&text).map(Some);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_consecutive_performatives() {
        let wire = b"(tell :content (module-status ready))\n(reply :content (SUCCESS))";
        let mut reader = &wire[..];
        let first = read_performative(&mut reader).await.unwrap().unwrap();
        assert_eq!(first.verb(), "tell");
        let second = read_performative(&mut reader).await.unwrap().unwrap();
        assert_eq!(second.verb(), "reply");
        assert!(read_performative(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_parens_inside_strings_do_not_frame() {
        let wire = br#"(tell :content (add-provenance :html "see (fig 1)"))"#;
        let mut reader = &wire[..];
        let perf = read_performative(&mut reader).await.unwrap().unwrap();
        let content = perf.get_list("content").unwrap();
        assert_eq!(content.gets("html"), Some("see (fig 1)"));
    }

    #[tokio::test]
    async fn test_eof_mid_expression_is_an_error() {
        let wire = b"(request :content (FIND-";
        let mut reader = &wire[..];
        let err = read_performative(&mut reader).await.unwrap_err();
        assert!(matches!(err, KqmlError::UnexpectedEof { .. }));
    }
}
