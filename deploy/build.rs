/*!

The cluster-side bootstrap resources are modeled as Rust structs in the
models crate. Here we render the corresponding k8s yaml manifest, which
cluster tooling applies once to install the machine.

!*/

use models::machine::{
    sdm_cluster_role, sdm_cluster_role_binding, sdm_deployment, sdm_service_account,
};
use models::namespace::sdm_namespace;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

const DEPLOY_DIR: &str = env!("CARGO_MANIFEST_DIR");
const DEFAULT_MACHINE_IMAGE: &str = "atomist/k8s-sdm:latest";
const HEADER: &str = "# This file is generated. Do not edit.\n";
const YAML_DOC_LEADER: &str = "---\n";

fn main() {
    dotenv::dotenv().ok();
    // Re-run this build script if the model changes.
    println!("cargo:rerun-if-changed=../models/src");
    // Re-run the yaml generation if these variables change
    println!("cargo:rerun-if-env-changed=MACHINE_CONTAINER_IMAGE");
    println!("cargo:rerun-if-env-changed=MACHINE_CONTAINER_IMAGE_PULL_SECRET");

    let machine_image =
        env::var("MACHINE_CONTAINER_IMAGE").unwrap_or_else(|_| DEFAULT_MACHINE_IMAGE.to_string());
    let image_pull_secret = env::var("MACHINE_CONTAINER_IMAGE_PULL_SECRET").ok();

    let manifest_dir = PathBuf::from(DEPLOY_DIR).join("manifests");
    fs::create_dir_all(&manifest_dir).unwrap();
    let mut manifest = File::create(manifest_dir.join("k8s-sdm.yaml")).unwrap();

    manifest.write_all(HEADER.as_bytes()).unwrap();

    manifest.write_all(YAML_DOC_LEADER.as_bytes()).unwrap();
    serde_yaml::to_writer(&manifest, &sdm_namespace()).unwrap();

    manifest.write_all(YAML_DOC_LEADER.as_bytes()).unwrap();
    serde_yaml::to_writer(&manifest, &sdm_service_account()).unwrap();

    manifest.write_all(YAML_DOC_LEADER.as_bytes()).unwrap();
    serde_yaml::to_writer(&manifest, &sdm_cluster_role()).unwrap();

    manifest.write_all(YAML_DOC_LEADER.as_bytes()).unwrap();
    serde_yaml::to_writer(&manifest, &sdm_cluster_role_binding()).unwrap();

    manifest.write_all(YAML_DOC_LEADER.as_bytes()).unwrap();
    serde_yaml::to_writer(&manifest, &sdm_deployment(machine_image, image_pull_secret)).unwrap();
}
