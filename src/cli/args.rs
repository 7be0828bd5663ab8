//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate Markdown catalogs from architecture specifications
#[derive(Parser, Debug)]
#[command(name = "apicatalog")]
#[command(about = "Generate Markdown catalogs from architecture specifications")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble the catalog and write it as Markdown
    Generate {
        /// Specification file or directory
        spec: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Title of the root page
        #[arg(long)]
        title: Option<String>,

        /// Worker threads used to assemble sequence diagrams
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Directory with custom project.md.tera and package.md.tera templates
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// List the packages, applications and endpoints that would be documented
    List {
        /// Specification file or directory
        spec: PathBuf,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}
