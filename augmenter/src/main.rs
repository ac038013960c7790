//! Command line bridge between descriptor files and the augmentation
//! pipeline. The deployment engine hands over the raw application descriptor
//! and the goal configuration as JSON; this binary runs the pipeline once and
//! prints the augmented descriptor for the engine to apply.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use argh::FromArgs;
use snafu::ResultExt;
use tracing::{event, Level};

use models::augment::prepare_for_self_deploy;
use models::descriptor::{AppDescriptor, SelfDeployGoal};
use models::telemetry;

/// The module-wide result type.
type Result<T> = std::result::Result<T, augmenter_error::Error>;

/// Augment a Kubernetes application descriptor so this machine can deploy
/// itself, and print the result as JSON.
#[derive(FromArgs, Debug)]
struct Args {
    /// path to the application descriptor JSON file
    #[argh(option)]
    app_data: PathBuf,

    /// path to the goal configuration JSON file
    #[argh(option)]
    goal_config: PathBuf,

    /// name of the active kubernetes cluster context, if any
    #[argh(option, default = "String::new()")]
    context: String,
}

fn main() {
    let args: Args = argh::from_env();
    if let Err(e) = run(args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    telemetry::init_telemetry_from_env().context(augmenter_error::TelemetryInitSnafu)?;

    let app: AppDescriptor = read_json(&args.app_data)?;
    let goal: SelfDeployGoal = read_json(&args.goal_config)?;

    event!(
        Level::INFO,
        app = %app.name,
        context = %args.context,
        "augmenting descriptor for self deploy"
    );
    let augmented = prepare_for_self_deploy(app, &goal, &args.context)
        .context(augmenter_error::AugmentSnafu)?;

    let rendered = serde_json::to_string_pretty(augmented.app())
        .context(augmenter_error::RenderDescriptorSnafu)?;
    println!("{}", rendered);

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).context(augmenter_error::ReadInputSnafu {
        path: path.to_path_buf(),
    })?;
    serde_json::from_str(&raw).context(augmenter_error::ParseInputSnafu {
        path: path.to_path_buf(),
    })
}

pub mod augmenter_error {
    use models::augment::augment_error;
    use models::telemetry;
    use snafu::Snafu;
    use std::path::PathBuf;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub))]
    pub enum Error {
        #[snafu(display("Error configuring telemetry: '{}'", source))]
        TelemetryInit {
            source: telemetry::TelemetryConfigError,
        },

        #[snafu(display("Unable to read input file '{}': '{}'", path.display(), source))]
        ReadInput {
            source: std::io::Error,
            path: PathBuf,
        },

        #[snafu(display("Unable to parse input file '{}': '{}'", path.display(), source))]
        ParseInput {
            source: serde_json::Error,
            path: PathBuf,
        },

        #[snafu(display("Unable to augment descriptor: '{}'", source))]
        Augment { source: augment_error::Error },

        #[snafu(display("Unable to render augmented descriptor: '{}'", source))]
        RenderDescriptor { source: serde_json::Error },
    }
}
