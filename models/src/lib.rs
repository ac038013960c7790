pub mod augment;
pub mod constants;
pub mod descriptor;
pub mod machine;
pub mod merge;
pub mod namespace;
pub mod secret;
pub mod telemetry;
