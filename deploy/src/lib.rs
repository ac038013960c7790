//! This crate exists for its build script, which renders the bootstrap
//! manifest under `manifests/`. See `build.rs`.
