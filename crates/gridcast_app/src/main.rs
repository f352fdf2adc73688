mod platform;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gridcast_core::{Feature, JobRequest, ProjectValidation};
use gridcast_logging::level_from_name;

use platform::commands;
use platform::config::{ClientConfig, CONFIG_FILENAME};

#[derive(Parser)]
#[command(name = "gridcast", version, about = "Submit and follow demand forecasting jobs")]
struct Cli {
    /// Client configuration (RON)
    #[arg(long, global = true, default_value = CONFIG_FILENAME)]
    config: PathBuf,
    /// Server API base URL; overrides the config file
    #[arg(long, global = true)]
    server: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run a demand forecast described by a JSON file and follow it
    Forecast { file: PathBuf },
    /// Generate a load profile described by a JSON file and follow it
    LoadProfile { file: PathBuf },
    /// Show the current status of a job
    Status { feature: Feature, job_id: String },
    /// Ask the server to cancel a job
    Cancel { feature: Feature, job_id: String },
    /// Project commands
    Project {
        #[command(subcommand)]
        cmd: ProjectCmd,
    },
}

#[derive(Subcommand)]
enum ProjectCmd {
    /// Validate a project folder and add it to the recent list
    Open {
        path: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// List recently opened projects
    Recent,
    /// Remove a project from the recent list (server first)
    Forget { path: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::load(&cli.config)?.with_server(cli.server);
    platform::logging::initialize(config.log_destination, level_from_name(&config.log_level));

    match cli.cmd {
        Cmd::Forecast { file } => {
            let request = JobRequest::Forecast(commands::read_request_file(&file)?);
            commands::follow_job(&config, request, None)
        }
        Cmd::LoadProfile { file } => {
            let request = JobRequest::LoadProfile(commands::read_request_file(&file)?);
            commands::follow_job(&config, request, None)
        }
        Cmd::Status { feature, job_id } => commands::show_status(&config, feature, &job_id),
        Cmd::Cancel { feature, job_id } => commands::cancel_job(&config, feature, &job_id),
        Cmd::Project { cmd } => match cmd {
            ProjectCmd::Open { path, name } => {
                let request = JobRequest::ValidateProject(ProjectValidation { project_path: path });
                commands::follow_job(&config, request, name)
            }
            ProjectCmd::Recent => commands::list_recent(&config),
            ProjectCmd::Forget { path } => commands::forget_project(&config, &path),
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
    fn feature_accepts_kebab_case() {
        let cli = Cli::try_parse_from(["gridcast", "status", "load-profile", "lp-1"]).unwrap();
        match cli.cmd {
            Cmd::Status { feature, job_id } => {
                assert_eq!(feature, Feature::LoadProfile);
                assert_eq!(job_id, "lp-1");
            }
            _ => panic!("expected status"),
        }
    }

    #[test]
    fn server_flag_is_global() {
        let cli = Cli::try_parse_from([
            "gridcast",
            "project",
            "open",
            "/data/kerala",
            "--name",
            "Kerala",
            "--server",
            "http://10.0.0.5/api",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://10.0.0.5/api"));
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILENAME));
        assert!(matches!(
            cli.cmd,
            Cmd::Project {
                cmd: ProjectCmd::Open { name: Some(_), .. }
            }
        ));
    }

    #[test]
    fn unknown_feature_is_rejected() {
        assert!(Cli::try_parse_from(["gridcast", "cancel", "weather", "x"]).is_err());
    }
}
