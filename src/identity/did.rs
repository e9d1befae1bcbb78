/// DID method parsing
use crate::error::{ResolverError, ResolverResult};

pub const DID_WEB_PREFIX: &str = "did:web:";
pub const DID_PLC_PREFIX: &str = "did:plc:";

/// The DID methods this service can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DidMethod {
    Web,
    Plc,
}

impl DidMethod {
    /// Pick the resolution method from a DID's prefix
    ///
    /// Anything other than `did:web:` or `did:plc:` is rejected outright.
    pub fn from_did(did: &str) -> ResolverResult<Self> {
        if did.starts_with(DID_WEB_PREFIX) {
            Ok(DidMethod::Web)
        } else if did.starts_with(DID_PLC_PREFIX) {
            Ok(DidMethod::Plc)
        } else {
            Err(ResolverError::UnsupportedMethod(did.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DidMethod::Web => "web",
            DidMethod::Plc => "plc",
        }
    }
}

/// Method-specific id of a DID (everything after `did:<method>:`)
pub fn method_specific_id(did: &str) -> Option<&str> {
    let mut parts = did.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some(_), Some(id)) => Some(id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_dispatch() {
        assert_eq!(DidMethod::from_did("did:web:example.com").unwrap(), DidMethod::Web);
        assert_eq!(DidMethod::from_did("did:plc:ewvi7nxzyoun6zhxrhs64oiz").unwrap(), DidMethod::Plc);
    }

    #[test]
    fn test_unknown_method_rejected() {
        for did in ["did:example:123", "did:key:zQ3sh", "did:webx:example.com", "web:example.com", ""] {
            assert!(matches!(
                DidMethod::from_did(did),
                Err(ResolverError::UnsupportedMethod(_))
            ));
        }
    }

    #[test]
    fn test_method_specific_id() {
        assert_eq!(method_specific_id("did:web:example.com"), Some("example.com"));
        assert_eq!(method_specific_id("did:web:example.com:user:alice"), Some("example.com:user:alice"));
        assert_eq!(method_specific_id("did:plc:"), Some(""));
        assert_eq!(method_specific_id("did:plc"), None);
    }
}
