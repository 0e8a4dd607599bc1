//! Artifact fingerprint CLI
//!
//! Entry point for the `fingerprint` command-line tool.

use artifact_fingerprint::{
    evaluate_paths_spec, evaluate_server_paths, fingerprint_artifact, load_paths_spec, logging,
    validate_fingerprint, ArtifactOptions, ArtifactRecord, ArtifactType, RegistryAccess,
    RegistryCredentials,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "fingerprint")]
#[command(about = "Calculate SHA256 fingerprints of files, directories and container images", version)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fingerprint of one artifact
    Artifact {
        /// File or directory path, or image reference for docker
        name: String,

        /// Artifact type: file, dir, docker or oci
        #[arg(long, short = 't', env = "FINGERPRINT_ARTIFACT_TYPE")]
        artifact_type: ArtifactType,

        /// Paths to leave out of a dir fingerprint (comma-separated, globs allowed)
        #[arg(long, short = 'x', value_delimiter = ',')]
        exclude: Vec<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Fingerprint the artifacts listed in a paths spec file
    Paths {
        /// Paths spec file (.yml, .yaml, .json or .toml)
        #[arg(long)]
        paths_file: PathBuf,
    },

    /// Fingerprint every path matching the given globs
    Server {
        /// Paths or globs to fingerprint (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        paths: Vec<String>,

        /// Paths to leave out of directory fingerprints (comma-separated)
        #[arg(long, short = 'x', value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Check that a string is a well-formed SHA256 fingerprint
    Validate {
        fingerprint: String,
    },
}

/// Remote registry lookup for docker artifacts, and the login for oci ones
#[derive(Args, Debug, Default)]
struct RegistryArgs {
    /// Registry provider: dockerhub, github, or a registry host
    #[arg(long, env = "FINGERPRINT_REGISTRY_PROVIDER")]
    registry_provider: Option<String>,

    /// Registry username
    #[arg(long, env = "FINGERPRINT_REGISTRY_USERNAME")]
    registry_username: Option<String>,

    /// Registry password or token
    #[arg(long, env = "FINGERPRINT_REGISTRY_PASSWORD", hide_env_values = true)]
    registry_password: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Artifact {
            name,
            artifact_type,
            exclude,
            registry,
        } => {
            run_artifact(&name, artifact_type, exclude, registry);
        }
        Commands::Paths { paths_file } => {
            run_paths(paths_file);
        }
        Commands::Server { paths, exclude } => {
            run_server(&paths, &exclude);
        }
        Commands::Validate { fingerprint } => {
            run_validate(&fingerprint);
        }
    }
}

fn run_artifact(name: &str, artifact_type: ArtifactType, exclude: Vec<String>, registry: RegistryArgs) {
    let options = match artifact_options(artifact_type, exclude, registry) {
        Ok(options) => options,
        Err(e) => fail(e),
    };

    match fingerprint_artifact(artifact_type, name, &options) {
        Ok(fingerprint) => println!("{}", fingerprint),
        Err(e) => fail(e),
    }
}

fn run_paths(paths_file: PathBuf) {
    let records = load_paths_spec(&paths_file).and_then(|spec| evaluate_paths_spec(&spec));
    match records {
        Ok(records) => print_records(&records),
        Err(e) => fail(e),
    }
}

fn run_server(paths: &[String], exclude: &[String]) {
    match evaluate_server_paths(paths, exclude) {
        Ok(records) => print_records(&records),
        Err(e) => fail(e),
    }
}

fn run_validate(fingerprint: &str) {
    match validate_fingerprint(fingerprint) {
        Ok(()) => println!("{} is a valid SHA256 fingerprint", fingerprint),
        Err(e) => fail(e),
    }
}

fn print_records(records: &[ArtifactRecord]) {
    match serde_json::to_string_pretty(records) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("serializing output: {}", e)),
    }
}

/// Check the registry flags against the artifact type
fn artifact_options(
    artifact_type: ArtifactType,
    excludes: Vec<String>,
    args: RegistryArgs,
) -> Result<ArtifactOptions, String> {
    let RegistryArgs {
        registry_provider,
        registry_username,
        registry_password,
    } = args;

    let credentials = match (registry_username, registry_password) {
        (Some(username), Some(password)) => Some(RegistryCredentials { username, password }),
        (None, None) => None,
        _ => {
            return Err(
                "both --registry-username and --registry-password are required".to_string(),
            )
        }
    };

    let mut options = ArtifactOptions {
        excludes,
        ..ArtifactOptions::default()
    };

    if artifact_type == ArtifactType::Oci {
        if registry_provider.is_some() {
            return Err(
                "--registry-provider is not used for oci artifacts, the registry comes from the image name"
                    .to_string(),
            );
        }
        options.credentials = credentials;
        return Ok(options);
    }

    match (registry_provider, credentials) {
        (None, None) => {}
        (None, Some(_)) => {
            return Err(
                "--registry-username and --registry-password are only used together with --registry-provider"
                    .to_string(),
            )
        }
        (Some(_), _) if artifact_type != ArtifactType::Docker => {
            return Err("--registry-provider is only valid for docker artifacts".to_string())
        }
        (Some(provider), Some(credentials)) => {
            options.registry = Some(RegistryAccess {
                provider,
                credentials,
            })
        }
        (Some(_), None) => {
            return Err(
                "both --registry-username and --registry-password are required with --registry-provider"
                    .to_string(),
            )
        }
    }
    Ok(options)
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", err);
    process::exit(1);
}
