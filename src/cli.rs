// ABOUTME: Command-line interface definition for the netcalc binary

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::client::ComputeRoute;

#[derive(Debug, Parser)]
#[command(name = "netcalc", version, about = "Terminal calculator backed by a remote compute service")]
pub struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Directory for diagnostic and audit logs
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Override the compute base URL from the settings file
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Override the bearer token from the settings file
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Post to `{base}/compute` or to the per-operator `{base}/add|sub|mul|div`
    #[arg(long, global = true, value_enum, default_value_t = RouteArg::Compute)]
    pub route: RouteArg,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RouteArg {
    #[default]
    Compute,
    PerOperator,
}

impl From<RouteArg> for ComputeRoute {
    fn from(route: RouteArg) -> Self {
        match route {
            RouteArg::Compute => Self::Generic,
            RouteArg::PerOperator => Self::PerOperator,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a single expression remotely and print the result
    Eval {
        #[arg(allow_negative_numbers = true)]
        left: String,
        /// One of + - * / (x and × also multiply, ÷ divides)
        #[arg(allow_hyphen_values = true)]
        op: String,
        #[arg(allow_negative_numbers = true)]
        right: String,
    },
    /// Inspect or change the API settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the current settings and resolved base URL
    Show,
    /// Update and save settings, then check the new endpoint
    Set {
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        port: Option<u32>,
        /// Pass an empty string to remove the token
        #[arg(long)]
        token: Option<String>,
    },
    /// Probe the configured server's health endpoint
    Test,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_accepts_minus_operator_and_negative_operands() {
        let cli = Cli::try_parse_from(["netcalc", "eval", "-3", "-", "2.5"]).unwrap();
        match cli.command {
            Some(Command::Eval { left, op, right }) => {
                assert_eq!(left, "-3");
                assert_eq!(op, "-");
                assert_eq!(right, "2.5");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_runs_the_terminal_ui() {
        let cli = Cli::try_parse_from(["netcalc", "--base-url", "http://localhost:8080/calc/"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8080/calc/"));
    }

    #[test]
    fn route_defaults_to_generic_endpoint() {
        let cli = Cli::try_parse_from(["netcalc"]).unwrap();
        assert_eq!(ComputeRoute::from(cli.route), ComputeRoute::Generic);

        let cli = Cli::try_parse_from(["netcalc", "eval", "9", "/", "3", "--route", "per-operator"]).unwrap();
        assert_eq!(ComputeRoute::from(cli.route), ComputeRoute::PerOperator);
    }

    #[test]
    fn settings_set_parses_port() {
        let cli = Cli::try_parse_from(["netcalc", "settings", "set", "--port", "8443"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Settings {
                action: SettingsCommand::Set { port: Some(8443), .. }
            })
        ));
    }
}
