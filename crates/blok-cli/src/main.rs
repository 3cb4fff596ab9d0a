mod commands;
mod logging;

use anyhow::Context;
use blok_core::BlokConfig;
use blok_deploy::Environment;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "blok", version, about = "Provision a backend and generate its client app")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Configuration file. Defaults to ./blok.yaml when present.
    #[arg(long, global = true, env = "BLOK_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace). Overrides `logging.level`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print reports as JSON on stdout.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a schema file without contacting the platform.
    Validate {
        /// Schema document (.json, .yaml or .yml)
        schema: PathBuf,
    },

    /// Deploy a backend for a schema and generate a client app for it.
    Create {
        /// Display name; its slug names the project directory
        #[arg(long)]
        name: String,

        /// Schema document (.json, .yaml or .yml)
        #[arg(long)]
        schema: PathBuf,

        #[arg(long, default_value = "")]
        description: String,

        /// Directory the project directory is created in
        #[arg(long, default_value = ".")]
        destination: PathBuf,

        /// Return after submitting instead of waiting for the deployment
        #[arg(long, default_value_t = false)]
        no_wait: bool,

        /// Run the package manager once the project is generated
        #[arg(long, conflicts_with = "no_install")]
        install: bool,

        /// Skip the package manager even when the config enables it
        #[arg(long)]
        no_install: bool,
    },

    /// Generate client code into an existing project; nothing is deployed.
    Scaffold {
        /// Existing project root
        root: PathBuf,

        /// Schema document (.json, .yaml or .yml)
        #[arg(long)]
        schema: PathBuf,

        /// App name shown in the navigation. Defaults to the directory name.
        #[arg(long)]
        name: Option<String>,

        /// API the generated client talks to; also written to .env
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Continue a failed or interrupted run.
    Resume {
        /// Project root of the run
        root: PathBuf,

        /// Submit the deployment again instead of polling the saved job
        #[arg(long, default_value_t = false)]
        resubmit: bool,
    },

    /// Show saved runs, or one run in detail.
    Status {
        /// Project root; lists every saved run when omitted
        root: Option<PathBuf>,
    },

    /// Remove or roll back a remote project. Never done automatically.
    Cleanup {
        #[command(subcommand)]
        cmd: CleanupCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CleanupCommand {
    /// Delete a remote project
    Delete {
        /// Project id, or a project root with a saved run
        project: String,
    },

    /// Roll a remote project back to an earlier schema version
    Rollback {
        /// Project id, or a project root with a saved run
        project: String,

        #[arg(long)]
        version: String,

        #[arg(long, default_value = "staging")]
        environment: Environment,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = BlokConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    let output = commands::Output { json: cli.json };

    match cli.cmd {
        Command::Validate { schema } => commands::validate::execute(&schema, output),

        Command::Create {
            name,
            schema,
            description,
            destination,
            no_wait,
            install,
            no_install,
        } => {
            let install = match (install, no_install) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let args = commands::run::CreateArgs {
                name,
                schema,
                description,
                destination,
                wait: no_wait.then_some(false),
                install,
            };
            commands::run::create(config, args, output).await
        }

        Command::Scaffold {
            root,
            schema,
            name,
            api_url,
        } => commands::run::scaffold(config, root, &schema, name, api_url, output).await,

        Command::Resume { root, resubmit } => {
            commands::run::resume(config, &root, resubmit, output).await
        }

        Command::Status { root } => commands::status::execute(&config, root.as_deref(), output),

        Command::Cleanup { cmd } => match cmd {
            CleanupCommand::Delete { project } => {
                commands::cleanup::delete(&config, &project).await
            }
            CleanupCommand::Rollback {
                project,
                version,
                environment,
            } => commands::cleanup::rollback(&config, &project, &version, environment, output).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_flags_parse() {
        let cli = Cli::try_parse_from([
            "blok",
            "create",
            "--name",
            "Task Manager",
            "--schema",
            "schema.json",
            "--no-wait",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.cmd {
            Command::Create { name, no_wait, destination, .. } => {
                assert_eq!(name, "Task Manager");
                assert!(no_wait);
                assert_eq!(destination, PathBuf::from("."));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn install_flags_conflict() {
        let err = Cli::try_parse_from([
            "blok", "create", "--name", "x", "--schema", "s.json", "--install", "--no-install",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rollback_environment_parses() {
        let cli = Cli::try_parse_from([
            "blok", "cleanup", "rollback", "proj-1", "--version", "3", "--environment", "production",
        ])
        .unwrap();
        match cli.cmd {
            Command::Cleanup {
                cmd: CleanupCommand::Rollback { environment, .. },
            } => assert_eq!(environment, Environment::Production),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
