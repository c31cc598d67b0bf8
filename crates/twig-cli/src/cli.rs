use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "twig",
    about = "twig: compare two trees leaf by leaf",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show differences between two directory trees
    Diff(DiffArgs),
    /// List the paths a pattern selects in a tree
    Ls(LsArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// Old tree
    pub old: PathBuf,
    /// New tree
    pub new: PathBuf,
    /// Globs selecting what to compare (default: everything)
    pub patterns: Vec<String>,
    /// Maximum directory depth to descend (default: unlimited)
    #[arg(long)]
    pub depth: Option<usize>,
    /// Print only the paths of changed leaves
    #[arg(long, conflicts_with = "name_status")]
    pub name_only: bool,
    /// Print the paths of changed leaves with an A/D/M status
    #[arg(long)]
    pub name_status: bool,
    /// Compare structured files byte for byte instead of value by value
    #[arg(long)]
    pub no_structural: bool,
    /// Stop at the first error
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Args)]
pub struct LsArgs {
    /// Tree to list
    pub root: PathBuf,
    /// Globs to match (default: top-level entries)
    pub patterns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_diff_flags() {
        let cli = Cli::parse_from([
            "twig", "diff", "a", "b", "/roles/*", "--depth", "0", "--name-status",
        ]);
        let Command::Diff(args) = cli.command else {
            panic!("expected diff");
        };
        assert_eq!(args.old, PathBuf::from("a"));
        assert_eq!(args.patterns, vec!["/roles/*"]);
        assert_eq!(args.depth, Some(0));
        assert!(args.name_status);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn name_only_conflicts_with_name_status() {
        let result = Cli::try_parse_from(["twig", "diff", "a", "b", "--name-only", "--name-status"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_format_flag() {
        let cli = Cli::parse_from(["twig", "ls", "dir", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
