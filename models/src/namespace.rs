use crate::constants::{NAMESPACE, SDM};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::ObjectMeta;
use maplit::btreemap;

/// Defines the sdm namespace
pub fn sdm_namespace() -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            labels: Some(btreemap! {
                "name".to_string() => SDM.to_string()
            }),
            name: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: None,
        status: None,
    }
}
