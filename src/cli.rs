use crate::{github, maven};
use clap::Parser;
use std::path::PathBuf;

/// Check for outdated Bazel WORKSPACE dependencies
#[derive(Parser, Debug, Clone)]
#[command(name = "bcu")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the WORKSPACE file to check
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Only check dependencies whose name starts with this prefix
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Print the edits without rewriting the file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Report dependency licenses as name,license rows instead of upgrading
    #[arg(short, long)]
    pub licenses: bool,

    /// GitHub API token for release listings
    #[arg(long, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL", default_value = github::API_URL)]
    pub github_api: String,

    /// Maven registry base URL
    #[arg(long, value_name = "URL", default_value = maven::CENTRAL_URL)]
    pub maven_repo: String,
}
