//! Cluster-side bootstrap resources for the machine itself: namespace-scoped
//! service account, cluster-wide RBAC, and the Deployment that runs it. The
//! augmentation pipeline's secret, volume, and mount naming must stay
//! consistent with what these resources expect, so both draw from
//! [`crate::constants`].

use crate::constants::{
    APP_COMPONENT, APP_MANAGED_BY, APP_PART_OF, CLIENT_CONFIG_FILE, CONFIG_MOUNT_PATH,
    CONFIG_PATH_ENV_VAR, CONFIG_SECRET_FILE_MODE, LABEL_COMPONENT, MACHINE,
    MACHINE_HEALTH_CHECK_ROUTE, MACHINE_INTERNAL_PORT, MACHINE_NAME, NAMESPACE, SDM,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, HTTPGetAction, LocalObjectReference, PodSpec,
    PodTemplateSpec, Probe, ResourceRequirements, SecretVolumeSource, ServiceAccount, Volume,
    VolumeMount,
};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use maplit::btreemap;

const MACHINE_SERVICE_ACCOUNT: &str = "sdm-machine-service-account";
const MACHINE_CLUSTER_ROLE: &str = "sdm-machine-role";

/// Defines the sdm-machine service account
pub fn sdm_service_account() -> ServiceAccount {
    ServiceAccount {
        metadata: ObjectMeta {
            name: Some(MACHINE_SERVICE_ACCOUNT.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            annotations: Some(btreemap! {
                "kubernetes.io/service-account.name".to_string() => MACHINE_SERVICE_ACCOUNT.to_string()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Defines the sdm-machine cluster role.
///
/// The machine creates and maintains whole applications, so it needs write
/// access to the core workload resources as well as to the RBAC objects it
/// stamps out for deployed applications.
pub fn sdm_cluster_role() -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some(MACHINE_CLUSTER_ROLE.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        rules: Some(vec![
            PolicyRule {
                api_groups: Some(vec!["".to_string()]),
                resources: Some(vec![
                    "namespaces".to_string(),
                    "pods".to_string(),
                    "secrets".to_string(),
                    "serviceaccounts".to_string(),
                    "services".to_string(),
                ]),
                verbs: resource_verbs(),
                ..Default::default()
            },
            PolicyRule {
                api_groups: Some(vec!["apps".to_string(), "extensions".to_string()]),
                resources: Some(vec!["deployments".to_string(), "ingresses".to_string()]),
                verbs: resource_verbs(),
                ..Default::default()
            },
            PolicyRule {
                api_groups: Some(vec!["networking.k8s.io".to_string()]),
                resources: Some(vec!["ingresses".to_string()]),
                verbs: resource_verbs(),
                ..Default::default()
            },
            PolicyRule {
                api_groups: Some(vec!["rbac.authorization.k8s.io".to_string()]),
                resources: Some(vec![
                    "clusterrolebindings".to_string(),
                    "clusterroles".to_string(),
                    "rolebindings".to_string(),
                    "roles".to_string(),
                ]),
                verbs: resource_verbs(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    }
}

fn resource_verbs() -> Vec<String> {
    vec![
        "create", "delete", "get", "list", "patch", "update", "watch",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Defines the sdm-machine cluster role binding
pub fn sdm_cluster_role_binding() -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some("sdm-machine-role-binding".to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: MACHINE_CLUSTER_ROLE.to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: MACHINE_SERVICE_ACCOUNT.to_string(),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        }]),
    }
}

/// Defines the sdm-machine deployment
pub fn sdm_deployment(machine_image: String, image_pull_secret: Option<String>) -> Deployment {
    let image_pull_secrets =
        image_pull_secret.map(|secret| vec![LocalObjectReference { name: Some(secret) }]);

    Deployment {
        metadata: ObjectMeta {
            labels: Some(
                btreemap! {
                    APP_COMPONENT => MACHINE,
                    APP_MANAGED_BY => SDM,
                    APP_PART_OF => SDM,
                    LABEL_COMPONENT => MACHINE,
                }
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ),
            name: Some(MACHINE_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(btreemap! { LABEL_COMPONENT.to_string() => MACHINE.to_string()}),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(btreemap! {
                        LABEL_COMPONENT.to_string() => MACHINE.to_string(),
                    }),
                    namespace: Some(NAMESPACE.to_string()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        image: Some(machine_image),
                        image_pull_policy: None,
                        name: SDM.to_string(),
                        ports: Some(vec![ContainerPort {
                            container_port: MACHINE_INTERNAL_PORT,
                            ..Default::default()
                        }]),
                        liveness_probe: Some(Probe {
                            http_get: Some(HTTPGetAction {
                                path: Some(MACHINE_HEALTH_CHECK_ROUTE.to_string()),
                                port: IntOrString::Int(MACHINE_INTERNAL_PORT),
                                ..Default::default()
                            }),
                            initial_delay_seconds: Some(10),
                            ..Default::default()
                        }),
                        readiness_probe: Some(Probe {
                            http_get: Some(HTTPGetAction {
                                path: Some(MACHINE_HEALTH_CHECK_ROUTE.to_string()),
                                port: IntOrString::Int(MACHINE_INTERNAL_PORT),
                                ..Default::default()
                            }),
                            initial_delay_seconds: Some(10),
                            ..Default::default()
                        }),
                        resources: Some(ResourceRequirements {
                            limits: Some(btreemap! {
                                "cpu".to_string() => Quantity("500m".to_string()),
                                "memory".to_string() => Quantity("1Gi".to_string()),
                            }),
                            requests: Some(btreemap! {
                                "cpu".to_string() => Quantity("100m".to_string()),
                                "memory".to_string() => Quantity("320Mi".to_string()),
                            }),
                        }),
                        env: Some(vec![EnvVar {
                            name: CONFIG_PATH_ENV_VAR.to_string(),
                            value: Some(format!("{}/{}", CONFIG_MOUNT_PATH, CLIENT_CONFIG_FILE)),
                            ..Default::default()
                        }]),
                        volume_mounts: Some(vec![VolumeMount {
                            name: MACHINE_NAME.to_string(),
                            mount_path: CONFIG_MOUNT_PATH.to_string(),
                            read_only: Some(true),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    image_pull_secrets,
                    service_account_name: Some(MACHINE_SERVICE_ACCOUNT.to_string()),
                    volumes: Some(vec![Volume {
                        name: MACHINE_NAME.to_string(),
                        secret: Some(SecretVolumeSource {
                            secret_name: Some(MACHINE_NAME.to_string()),
                            default_mode: Some(CONFIG_SECRET_FILE_MODE),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deployment_runs_a_single_replica_in_the_sdm_namespace() {
        let deployment = sdm_deployment("atomist/k8s-sdm:1.0.0".to_string(), None);
        assert_eq!(deployment.metadata.namespace.as_deref(), Some("sdm"));
        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
    }

    #[test]
    fn health_probes_hit_the_machine_port() {
        let deployment = sdm_deployment("atomist/k8s-sdm:1.0.0".to_string(), None);
        let pod = deployment.spec.unwrap().template.spec.unwrap();
        let container = &pod.containers[0];

        for probe in [
            container.liveness_probe.as_ref().unwrap(),
            container.readiness_probe.as_ref().unwrap(),
        ] {
            let http_get = probe.http_get.as_ref().unwrap();
            assert_eq!(http_get.path.as_deref(), Some("/health"));
            assert_eq!(http_get.port, IntOrString::Int(2866));
        }
    }

    #[test]
    fn configuration_secret_is_mounted_read_only_at_the_config_path() {
        let deployment = sdm_deployment("atomist/k8s-sdm:1.0.0".to_string(), None);
        let pod = deployment.spec.unwrap().template.spec.unwrap();

        let mount = &pod.containers[0].volume_mounts.as_ref().unwrap()[0];
        assert_eq!(mount.mount_path, CONFIG_MOUNT_PATH);
        assert_eq!(mount.read_only, Some(true));

        let volume = &pod.volumes.as_ref().unwrap()[0];
        assert_eq!(volume.name, mount.name);
        let source = volume.secret.as_ref().unwrap();
        assert_eq!(source.secret_name.as_deref(), Some(MACHINE_NAME));
        assert_eq!(source.default_mode, Some(CONFIG_SECRET_FILE_MODE));

        let env = &pod.containers[0].env.as_ref().unwrap()[0];
        assert_eq!(env.name, CONFIG_PATH_ENV_VAR);
        assert_eq!(
            env.value.as_deref(),
            Some("/opt/atm/client.config.json")
        );
    }

    #[test]
    fn cluster_role_covers_core_apps_and_rbac_resources() {
        let role = sdm_cluster_role();
        let rules = role.rules.unwrap();
        let groups: Vec<String> = rules
            .iter()
            .flat_map(|rule| rule.api_groups.clone().unwrap_or_default())
            .collect();

        for group in [
            "",
            "apps",
            "extensions",
            "networking.k8s.io",
            "rbac.authorization.k8s.io",
        ] {
            assert!(groups.iter().any(|g| g == group), "missing group {:?}", group);
        }
        for rule in &rules {
            assert_eq!(rule.verbs, resource_verbs());
        }
    }

    #[test]
    fn role_binding_points_at_the_machine_service_account() {
        let binding = sdm_cluster_role_binding();
        assert_eq!(binding.role_ref.name, MACHINE_CLUSTER_ROLE);
        let subject = &binding.subjects.unwrap()[0];
        assert_eq!(subject.kind, "ServiceAccount");
        assert_eq!(subject.name, MACHINE_SERVICE_ACCOUNT);
        assert_eq!(subject.namespace.as_deref(), Some("sdm"));
    }
}
