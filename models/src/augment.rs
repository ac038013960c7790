//! Prepares an application descriptor for deploying this machine into its own
//! cluster: the target namespace is forced, the generated runtime
//! configuration is wired in as a mounted secret, and local development
//! clusters get ingress defaults for their bundled nginx controller.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{EnvVar, SecretVolumeSource, Volume, VolumeMount};
use k8s_openapi::api::networking::v1::Ingress;
use maplit::btreemap;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tracing::{event, Level};

use crate::constants::{
    CLIENT_CONFIG_FILE, CLUSTER_WORKERS, CONFIG_MOUNT_PATH, CONFIG_PATH_ENV_VAR,
    CONFIG_SECRET_FILE_MODE, LOCAL_INGRESS_PROTOCOL, MINIKUBE_CONTEXT, NAMESPACE,
};
use crate::descriptor::{AppDescriptor, AugmentedDescriptor, SelfDeployGoal};
use crate::merge;
use crate::secret::encode_secret;

/// The module-wide result type.
pub type Result<T> = std::result::Result<T, augment_error::Error>;

/// The runtime configuration handed to the deployed machine, mounted as
/// `client.config.json` inside the configuration secret.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub name: String,
    pub api_key: String,
    pub workspace_ids: Vec<String>,
    pub environment: String,
    pub cluster: ClusterConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClusterConfig {
    pub workers: u32,
}

/// Augments `app` so the deployment engine can deploy this machine.
///
/// Self-deploys always land in the `sdm` namespace, regardless of what the
/// caller put in the descriptor. The descriptor is consumed: every step
/// appends rather than reconciles, so the pipeline must run exactly once per
/// fresh descriptor, which the [`AugmentedDescriptor`] return type enforces.
pub fn prepare_for_self_deploy(
    mut app: AppDescriptor,
    goal: &SelfDeployGoal,
    cluster_context: &str,
) -> Result<AugmentedDescriptor> {
    app.namespace = NAMESPACE.to_string();
    embed_client_config(&mut app, goal, cluster_context)?;
    apply_local_ingress(&mut app, cluster_context);
    Ok(AugmentedDescriptor(app))
}

/// The label identifying where the deployed machine runs: the explicit
/// cluster context when non-empty, else the goal's deployment environment,
/// else the machine's own configured environment.
///
/// An all-empty chain is passed through unvalidated and yields a
/// configuration name ending in `_`.
fn effective_cluster_label<'a>(goal: &'a SelfDeployGoal, cluster_context: &'a str) -> &'a str {
    if !cluster_context.is_empty() {
        return cluster_context;
    }
    match goal.details.environment.as_deref() {
        Some(environment) if !environment.is_empty() => environment,
        _ => &goal.sdm.configuration.environment,
    }
}

/// Synthesizes the runtime configuration, encodes it into a secret named
/// after the application, and appends the secret plus its volume, mount, and
/// env var wiring to the descriptor.
fn embed_client_config(
    app: &mut AppDescriptor,
    goal: &SelfDeployGoal,
    cluster_context: &str,
) -> Result<()> {
    let label = effective_cluster_label(goal, cluster_context);
    let config = ClientConfig {
        name: format!("{}_{}", goal.sdm.configuration.name, label),
        api_key: goal.sdm.configuration.api_key.clone(),
        workspace_ids: vec![app.workspace_id.clone()],
        environment: label.to_string(),
        cluster: ClusterConfig {
            workers: CLUSTER_WORKERS,
        },
    };
    let config_json = serde_json::to_string(&config).context(
        augment_error::SerializeClientConfigSnafu {
            name: config.name.clone(),
        },
    )?;
    event!(
        Level::DEBUG,
        config = %config.name,
        "embedding generated client configuration"
    );

    let secret = encode_secret(
        &app.name,
        &btreemap! {
            CLIENT_CONFIG_FILE.to_string() => config_json,
        },
    );
    merge::push(&mut app.secrets, secret);

    let pod = app
        .deployment_spec
        .get_or_insert_with(Deployment::default)
        .spec
        .get_or_insert_with(Default::default)
        .template
        .spec
        .get_or_insert_with(Default::default);

    let volume = Volume {
        name: app.name.clone(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(app.name.clone()),
            default_mode: Some(CONFIG_SECRET_FILE_MODE),
            ..Default::default()
        }),
        ..Default::default()
    };
    merge::push(&mut pod.volumes, volume);

    let container = merge::first_container(pod);
    merge::push(
        &mut container.volume_mounts,
        VolumeMount {
            name: app.name.clone(),
            mount_path: CONFIG_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        },
    );
    merge::push(
        &mut container.env,
        EnvVar {
            name: CONFIG_PATH_ENV_VAR.to_string(),
            value: Some(format!("{}/{}", CONFIG_MOUNT_PATH, CLIENT_CONFIG_FILE)),
            ..Default::default()
        },
    );

    Ok(())
}

/// Rewrites ingress fields for a local minikube target. Any other cluster
/// context leaves the descriptor untouched.
fn apply_local_ingress(app: &mut AppDescriptor, cluster_context: &str) {
    if cluster_context != MINIKUBE_CONTEXT {
        return;
    }
    event!(Level::DEBUG, app = %app.name, "adding local cluster ingress settings");

    app.path = Some(format!("/{}/{}", app.namespace, app.name));
    app.protocol = Some(LOCAL_INGRESS_PROTOCOL.to_string());

    let ingress = app.ingress_spec.get_or_insert_with(Ingress::default);
    merge::merge_map_defaults(&mut ingress.metadata.annotations, local_ingress_annotations());
}

/// Annotation defaults for the nginx ingress controller bundled with local
/// development clusters. Anything the caller already set wins on conflict.
fn local_ingress_annotations() -> BTreeMap<String, String> {
    btreemap! {
        "kubernetes.io/ingress.class".to_string() => "nginx".to_string(),
        "nginx.ingress.kubernetes.io/rewrite-target".to_string() => "/".to_string(),
        "nginx.ingress.kubernetes.io/ssl-redirect".to_string() => "false".to_string(),
    }
}

pub mod augment_error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub))]
    pub enum Error {
        #[snafu(display("Unable to serialize client configuration '{}': '{}'", name, source))]
        SerializeClientConfig {
            source: serde_json::Error,
            name: String,
        },
    }
}
