/// DID document model and validation
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// DID document
///
/// Only `id` is required. Fields this service doesn't model are kept in
/// `extra` so documents round-trip through the cache unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Verification method (key) in a DID document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Service endpoint in a DID document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DidDocument {
    /// First `at://` alias, without the scheme
    pub fn handle(&self) -> Option<&str> {
        self.also_known_as
            .iter()
            .find_map(|aka| aka.strip_prefix("at://"))
    }

    /// Atproto signing key as a `did:key`
    pub fn signing_key(&self) -> Option<String> {
        let method = self.find_by_fragment(
            self.verification_method.iter().map(|vm| (vm.id.as_str(), vm)),
            "#atproto",
        )?;
        if method.key_type != "Multikey" {
            return None;
        }
        method
            .public_key_multibase
            .as_ref()
            .map(|key| format!("did:key:{}", key))
    }

    /// PDS endpoint advertised by the `#atproto_pds` service
    pub fn pds_endpoint(&self) -> Option<&str> {
        self.service_endpoint("#atproto_pds", "AtprotoPersonalDataServer")
    }

    /// Endpoint URL of the service with the given fragment and type
    pub fn service_endpoint(&self, fragment: &str, service_type: &str) -> Option<&str> {
        let service = self.find_by_fragment(
            self.service.iter().map(|s| (s.id.as_str(), s)),
            fragment,
        )?;
        if service.service_type != service_type {
            return None;
        }
        service.service_endpoint.as_str()
    }

    // Ids may be relative ("#atproto") or absolute ("did:plc:abc#atproto")
    fn find_by_fragment<'a, T>(
        &self,
        mut items: impl Iterator<Item = (&'a str, &'a T)>,
        fragment: &str,
    ) -> Option<&'a T> {
        items.find_map(|(id, item)| {
            let matches = id == fragment
                || id
                    .strip_prefix(self.id.as_str())
                    .map_or(false, |rest| rest == fragment);
            matches.then_some(item)
        })
    }
}

/// Validate a fetched payload against the DID it was fetched for
///
/// Returns `None` if the payload doesn't have the document shape or
/// declares a different `id`. This is a shape and identity gate only;
/// no signatures are checked.
pub fn validate_did_doc(did: &str, raw: Value) -> Option<DidDocument> {
    // A non-string or missing id fails deserialization, as do optional
    // fields of the wrong type.
    let doc: DidDocument = serde_json::from_value(raw).ok()?;
    if doc.id != did {
        return None;
    }
    Some(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn atproto_doc(did: &str) -> Value {
        json!({
            "@context": [
                "https://www.w3.org/ns/did/v1",
                "https://w3id.org/security/multikey/v1"
            ],
            "id": did,
            "alsoKnownAs": ["at://alice.example.com"],
            "verificationMethod": [{
                "id": format!("{}#atproto", did),
                "type": "Multikey",
                "controller": did,
                "publicKeyMultibase": "zQ3shXjHeiBuRCKmM36cuYnm7YEMzhGnCmCyW92sRJ9pribSF"
            }],
            "service": [{
                "id": "#atproto_pds",
                "type": "AtprotoPersonalDataServer",
                "serviceEndpoint": "https://pds.example.com"
            }]
        })
    }

    #[test]
    fn test_validate_matching_document() {
        let did = "did:plc:ewvi7nxzyoun6zhxrhs64oiz";
        let doc = validate_did_doc(did, atproto_doc(did)).unwrap();
        assert_eq!(doc.id, did);
        assert_eq!(doc.handle(), Some("alice.example.com"));
        assert_eq!(doc.pds_endpoint(), Some("https://pds.example.com"));
        assert_eq!(
            doc.signing_key().as_deref(),
            Some("did:key:zQ3shXjHeiBuRCKmM36cuYnm7YEMzhGnCmCyW92sRJ9pribSF")
        );
    }

    #[test]
    fn test_validate_rejects_mismatched_id() {
        let doc = atproto_doc("did:plc:attacker");
        assert!(validate_did_doc("did:plc:victim", doc).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_shape() {
        assert!(validate_did_doc("did:web:example.com", json!({})).is_none());
        assert!(validate_did_doc("did:web:example.com", json!({ "id": 42 })).is_none());
        assert!(validate_did_doc("did:web:example.com", json!("did:web:example.com")).is_none());
        assert!(validate_did_doc(
            "did:web:example.com",
            json!({ "id": "did:web:example.com", "alsoKnownAs": "at://a.example.com" })
        )
        .is_none());
    }

    #[test]
    fn test_validate_minimal_and_unknown_fields() {
        let did = "did:web:example.com";
        let doc = validate_did_doc(
            did,
            json!({ "id": did, "controller": did, "futureField": { "nested": true } }),
        )
        .unwrap();
        assert!(doc.service.is_empty());
        assert_eq!(doc.extra.get("futureField"), Some(&json!({ "nested": true })));

        // Unknown fields survive serialization
        let round = serde_json::to_value(&doc).unwrap();
        assert_eq!(round["futureField"]["nested"], json!(true));
    }

    #[test]
    fn test_atproto_helpers_absent() {
        let did = "did:web:example.com";
        let doc = validate_did_doc(
            did,
            json!({
                "id": did,
                "alsoKnownAs": ["https://example.com"],
                "service": [{
                    "id": "#atproto_pds",
                    "type": "SomethingElse",
                    "serviceEndpoint": "https://pds.example.com"
                }]
            }),
        )
        .unwrap();
        assert_eq!(doc.handle(), None);
        assert_eq!(doc.pds_endpoint(), None);
        assert_eq!(doc.signing_key(), None);
    }
}
