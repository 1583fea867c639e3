use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "motoplan",
    version,
    about = "Plan motorcycle rides with the weather along the route."
)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, env = "MOTOPLAN_CONFIG", global = true)]
    pub config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a ride and sample the weather along it
    Plan(PlanArgs),
    /// Manage saved routes
    Routes(RoutesCommand),
    /// Serve the planner over HTTP
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Where the ride starts, e.g. "Los Angeles"
    pub start: String,
    /// Where the ride ends
    pub end: String,
    /// Save the planned route
    #[arg(long)]
    pub save: bool,
    /// Ask for a ride difficulty summary
    #[arg(long)]
    pub insight: bool,
    /// Ask for a gear checklist
    #[arg(long)]
    pub packing: bool,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct RoutesCommand {
    #[command(subcommand)]
    pub cmd: RoutesSubCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoutesSubCommand {
    /// List saved routes, oldest first
    List,
    /// Delete a saved route
    Delete { id: String },
    /// Plan a saved route again
    Replay {
        id: String,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the saved routes every time they change
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan() {
        let cli = Cli::try_parse_from([
            "motoplan", "plan", "Denver", "Moab", "--save", "--insight", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.cmd {
            Command::Plan(args) => {
                assert_eq!(args.start, "Denver");
                assert_eq!(args.end, "Moab");
                assert!(args.save && args.insight);
                assert!(!args.packing && !args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_routes_delete() {
        let cli = Cli::try_parse_from(["motoplan", "routes", "delete", "abc123"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Routes(RoutesCommand {
                cmd: RoutesSubCommand::Delete { ref id }
            }) if id == "abc123"
        ));
    }
}
