/// Helper macro to avoid retyping the base domain-like name of our system when creating further
/// string constants from it. When given no parameters, this returns the base domain-like name of
/// the system. When given a string literal parameter it adds `/parameter` to the end.
#[macro_export]
macro_rules! atomist_domain {
    () => {
        "atomist.com"
    };
    ($s:literal) => {
        concat!(atomist_domain!(), "/", $s)
    };
}

pub const NAMESPACE: &str = "sdm";
pub const SDM: &str = "sdm";

// Label keys
pub const LABEL_COMPONENT: &str = atomist_domain!("component");

// Standard tags https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
pub const APP_COMPONENT: &str = "app.kubernetes.io/component";
pub const APP_PART_OF: &str = "app.kubernetes.io/part-of";
pub const APP_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

// machine deployment constants
pub const MACHINE: &str = "machine";
pub const MACHINE_NAME: &str = "k8s-sdm"; // The deployment name; also names the configuration secret and its volume.
pub const MACHINE_INTERNAL_PORT: i32 = 2866; // The port on which the machine hosts its health endpoints.
pub const MACHINE_HEALTH_CHECK_ROUTE: &str = "/health"; // Route used for k8s liveness and readiness checks.

// runtime configuration secret constants
pub const CONFIG_MOUNT_PATH: &str = "/opt/atm"; // Where the configuration secret is mounted into the container.
pub const CLIENT_CONFIG_FILE: &str = "client.config.json"; // The configuration file name within the secret.
pub const CONFIG_PATH_ENV_VAR: &str = "ATOMIST_CONFIG_PATH";
pub const CONFIG_SECRET_FILE_MODE: i32 = 0o400; // Owner read-only; the mount itself is read-only as well.
pub const CLUSTER_WORKERS: u32 = 2; // Worker process count handed to the deployed machine.

// local development cluster constants
pub const MINIKUBE_CONTEXT: &str = "minikube";
pub const LOCAL_INGRESS_PROTOCOL: &str = "http";
