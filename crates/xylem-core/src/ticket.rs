//! Ticket codec - canonical string form of entity names.
//!
//! A ticket is the opaque identifier handed to API clients in place of a
//! structured [`EntityName`]. The encoding is a URI-shaped string:
//!
//! ```text
//! xylem://<corpus>?lang=<language>?path=<path>?root=<root>#<signature>
//! ```
//!
//! Attributes appear in a fixed order and empty fields are omitted, so
//! encoding is canonical: equal names produce byte-equal tickets. Reserved
//! characters inside field values are percent-escaped, which makes
//! `parse_ticket(name.ticket()) == name` hold for every name, including
//! names whose fields contain `?`, `#`, `=`, or `%` themselves.

use crate::name::EntityName;
use thiserror::Error;

/// URI scheme prefix of every ticket.
const SCHEME: &str = "xylem://";

/// Why a ticket failed to decode.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TicketError {
    #[error("ticket does not start with {SCHEME:?}")]
    MissingScheme,
    #[error("malformed ticket attribute {0:?}")]
    MalformedAttribute(String),
    #[error("unknown ticket attribute {0:?}")]
    UnknownAttribute(String),
    #[error("duplicate ticket attribute {0:?}")]
    DuplicateAttribute(String),
    #[error("invalid percent escape in {0:?}")]
    BadEscape(String),
}

impl EntityName {
    /// Encodes this name as its canonical ticket string.
    pub fn ticket(&self) -> String {
        let mut out = String::with_capacity(SCHEME.len() + 32);
        out.push_str(SCHEME);
        out.push_str(&escape(&self.corpus));
        for (key, value) in [
            ("lang", &self.language),
            ("path", &self.path),
            ("root", &self.root),
        ] {
            if !value.is_empty() {
                out.push('?');
                out.push_str(key);
                out.push('=');
                out.push_str(&escape(value));
            }
        }
        if !self.signature.is_empty() {
            out.push('#');
            out.push_str(&escape(&self.signature));
        }
        out
    }

    /// Decodes a ticket back into the entity name it was encoded from.
    pub fn parse_ticket(ticket: &str) -> Result<Self, TicketError> {
        let rest = ticket
            .strip_prefix(SCHEME)
            .ok_or(TicketError::MissingScheme)?;

        let (head, signature) = match rest.split_once('#') {
            Some((head, fragment)) => (head, unescape(fragment)?),
            None => (rest, String::new()),
        };

        let mut segments = head.split('?');
        // The split always yields at least one (possibly empty) segment.
        let corpus = unescape(segments.next().unwrap_or_default())?;

        let mut name = EntityName {
            signature,
            corpus,
            ..Default::default()
        };
        for segment in segments {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| TicketError::MalformedAttribute(segment.to_string()))?;
            let field = match key {
                "lang" => &mut name.language,
                "path" => &mut name.path,
                "root" => &mut name.root,
                _ => return Err(TicketError::UnknownAttribute(key.to_string())),
            };
            if !field.is_empty() {
                return Err(TicketError::DuplicateAttribute(key.to_string()));
            }
            *field = unescape(value)?;
        }
        Ok(name)
    }
}

/// Percent-escapes every byte that could collide with a ticket delimiter.
///
/// Alphanumerics and `- . _ ~ /` pass through untouched; everything else
/// (including `?`, `#`, `=`, `%`, and non-ASCII bytes) becomes `%XX`.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push(hex_digit(byte >> 4));
                out.push(hex_digit(byte & 0x0f));
            }
        }
    }
    out
}

fn unescape(value: &str) -> Result<String, TicketError> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let (hi, lo) = match (bytes.get(i + 1), bytes.get(i + 2)) {
                (Some(&hi), Some(&lo)) => (hex_value(hi), hex_value(lo)),
                _ => (None, None),
            };
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                _ => return Err(TicketError::BadEscape(value.to_string())),
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| TicketError::BadEscape(value.to_string()))
}

fn hex_digit(nibble: u8) -> char {
    char::from_digit(u32::from(nibble), 16).unwrap_or('0').to_ascii_uppercase()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(name: &EntityName) {
        let ticket = name.ticket();
        assert_eq!(
            &EntityName::parse_ticket(&ticket).unwrap(),
            name,
            "ticket {ticket:?} did not round-trip",
        );
    }

    #[test]
    fn test_roundtrip_plain() {
        roundtrip(&EntityName {
            signature: "a1".into(),
            corpus: "acme".into(),
            root: "lib".into(),
            path: "src/main.rs".into(),
            language: "rust".into(),
        });
    }

    #[test]
    fn test_roundtrip_empty_fields() {
        roundtrip(&EntityName::default());
        roundtrip(&EntityName {
            path: "only/a/path".into(),
            ..Default::default()
        });
        roundtrip(&EntityName {
            signature: "sig only".into(),
            ..Default::default()
        });
    }

    #[test]
    fn test_roundtrip_hostile_fields() {
        roundtrip(&EntityName {
            signature: "a#b?c=d%e".into(),
            corpus: "weird corpus/with spaces".into(),
            root: "100%".into(),
            path: "a?b#c".into(),
            language: "küche".into(),
        });
    }

    #[test]
    fn test_encoding_is_canonical() {
        let name = EntityName {
            corpus: "c".into(),
            path: "p".into(),
            language: "go".into(),
            ..Default::default()
        };
        assert_eq!(name.ticket(), "xylem://c?lang=go?path=p");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(
            EntityName::parse_ticket("http://nope"),
            Err(TicketError::MissingScheme)
        );
        assert_eq!(
            EntityName::parse_ticket("xylem://c?huh=1"),
            Err(TicketError::UnknownAttribute("huh".into()))
        );
        assert_eq!(
            EntityName::parse_ticket("xylem://c?lang"),
            Err(TicketError::MalformedAttribute("lang".into()))
        );
        assert_eq!(
            EntityName::parse_ticket("xylem://c?lang=go?lang=rust"),
            Err(TicketError::DuplicateAttribute("lang".into()))
        );
        assert_eq!(
            EntityName::parse_ticket("xylem://bad%zzescape"),
            Err(TicketError::BadEscape("bad%zzescape".into()))
        );
    }
}
