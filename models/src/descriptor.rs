use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::networking::v1::Ingress;
use serde::{Deserialize, Serialize};

/// The desired deployed state of one application, as exchanged with the
/// external deployment engine.
///
/// Every nested structure is optional on input; the augmentation pipeline
/// lazily initializes whatever it needs instead of requiring callers to
/// build the full tree up front.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppDescriptor {
    /// Application name, unique per namespace.
    pub name: String,
    /// Target namespace. Ignored for self-deploys, which always land in `sdm`.
    pub namespace: String,
    /// Workspace the deployed machine serves.
    pub workspace_id: String,
    /// Ingress path routing external traffic to the application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Ingress protocol, `http` or `https`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Partial Deployment the engine completes and applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_spec: Option<Deployment>,
    /// Partial Ingress carrying caller-supplied metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_spec: Option<Ingress>,
    /// Secrets the engine creates alongside the application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<Secret>>,
}

/// An application descriptor that has been through the self-deploy pipeline.
///
/// Augmentation is additive: running it twice over the same descriptor would
/// wire the configuration secret, volume, mount, and env var in twice. The
/// pipeline therefore consumes its input and returns this wrapper, which it
/// does not accept back, so a second augmentation does not type-check.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct AugmentedDescriptor(pub(crate) AppDescriptor);

impl AugmentedDescriptor {
    /// The augmented descriptor, ready to submit to the deployment engine.
    pub fn app(&self) -> &AppDescriptor {
        &self.0
    }
}

/// Context of the currently executing self-deploy goal: the running machine's
/// own configuration plus per-goal details.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SelfDeployGoal {
    pub sdm: MachineContext,
    pub details: GoalDetails,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MachineContext {
    pub configuration: MachineConfiguration,
}

/// The running machine's own configuration, copied into the runtime
/// configuration handed to the deployed machine.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineConfiguration {
    pub name: String,
    pub api_key: String,
    pub environment: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GoalDetails {
    /// Environment this goal deploys to, when it differs from the machine's
    /// own configured environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}
