use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;

/// Encodes a key/value mapping into an Opaque `Secret` resource named `name`.
///
/// Values are carried as `ByteString`, which serializes to base64 on the wire
/// as the Secret `data` field requires.
pub fn encode_secret(name: &str, data: &BTreeMap<String, String>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(
            data.iter()
                .map(|(key, value)| (key.clone(), ByteString(value.clone().into_bytes())))
                .collect(),
        ),
        ..Default::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use maplit::btreemap;

    #[test]
    fn secret_is_named_and_opaque() {
        let secret = encode_secret("svc", &BTreeMap::new());
        assert_eq!(secret.metadata.name.as_deref(), Some("svc"));
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
    }

    #[test]
    fn secret_values_reach_the_wire_base64_encoded() {
        let secret = encode_secret(
            "svc",
            &btreemap! {
                "client.config.json".to_string() => r#"{"name":"x"}"#.to_string(),
            },
        );

        let wire = serde_json::to_value(&secret).unwrap();
        let encoded = wire["data"]["client.config.json"].as_str().unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, br#"{"name":"x"}"#);
    }
}
