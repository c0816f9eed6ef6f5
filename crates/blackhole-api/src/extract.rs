//! Organization-id extraction from notification bodies.
//!
//! The one piece of payload inspection this service does. Notification
//! bodies are SOAP-shaped XML, but nothing here validates them as such:
//! a single regex pulls the first `OrganizationId` element and the rest
//! of the body stays opaque.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

static ORG_ID_RE: OnceLock<Regex> = OnceLock::new();

fn org_id_regex() -> &'static Regex {
    ORG_ID_RE.get_or_init(|| {
        // Tolerates a namespace prefix on the tag; the element content
        // itself never contains markup.
        let pattern = r"<(?:[A-Za-z0-9_.-]+:)?OrganizationId>([^<]*)</(?:[A-Za-z0-9_.-]+:)?OrganizationId>";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("organization-id regex failed to compile: {error}"))
    })
}

/// Pulls the first `<OrganizationId>` element content out of a body.
///
/// Returns `None` for non-UTF-8 bodies, bodies without the element, and
/// elements that are empty after trimming. A missing identifier is a
/// non-event for the caller, not an error.
pub fn extract_org_id(body: &[u8]) -> Option<String> {
    let Ok(text) = std::str::from_utf8(body) else {
        debug!("notification body is not UTF-8, skipping extraction");
        return None;
    };

    let captures = org_id_regex().captures(text)?;
    let org_id = captures.get(1)?.as_str().trim();
    if org_id.is_empty() {
        return None;
    }
    Some(org_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_element_is_extracted() {
        let body = b"<notifications><OrganizationId>00D000000000062EA2</OrganizationId></notifications>";
        assert_eq!(extract_org_id(body).as_deref(), Some("00D000000000062EA2"));
    }

    #[test]
    fn namespace_prefixed_element_is_extracted() {
        let body = b"<soapenv:Body><sf:OrganizationId>00D000000000062EA2</sf:OrganizationId></soapenv:Body>";
        assert_eq!(extract_org_id(body).as_deref(), Some("00D000000000062EA2"));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let body = b"<OrganizationId>\n  00D000000000062EA2\n</OrganizationId>";
        assert_eq!(extract_org_id(body).as_deref(), Some("00D000000000062EA2"));
    }

    #[test]
    fn first_of_several_elements_wins() {
        let body = b"<OrganizationId>first</OrganizationId><OrganizationId>second</OrganizationId>";
        assert_eq!(extract_org_id(body).as_deref(), Some("first"));
    }

    #[test]
    fn missing_element_yields_none() {
        assert_eq!(extract_org_id(b"<notifications><ActionId>x</ActionId></notifications>"), None);
    }

    #[test]
    fn empty_element_yields_none() {
        assert_eq!(extract_org_id(b"<OrganizationId>   </OrganizationId>"), None);
    }

    #[test]
    fn non_utf8_body_yields_none() {
        assert_eq!(extract_org_id(&[0xff, 0xfe, 0x00, 0x3c]), None);
    }

    #[test]
    fn empty_body_yields_none() {
        assert_eq!(extract_org_id(b""), None);
    }
}
