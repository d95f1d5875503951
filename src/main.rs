use anyhow::{Context, Result};
use bcu::cli::Args;
use bcu::eval::{Declaration, scan_file};
use bcu::github::{GitHubClient, GitHubResolver};
use bcu::licenses::LicenseChecker;
use bcu::maven::MavenClient;
use bcu::replace;
use bcu::rules::Handlers;
use bcu::starlark;
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Parse the file and evaluate its dependency declarations
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let file = starlark::parse(&source)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;
    let declarations = scan_file(&file, &args.file)?;

    let maven = MavenClient::new().with_repo_url(&args.maven_repo);

    if args.licenses {
        return run_license_mode(&args, &declarations, maven).await;
    }
    run_upgrade_mode(&args, &declarations, maven).await
}

async fn run_upgrade_mode(
    args: &Args,
    declarations: &[Declaration],
    maven: MavenClient,
) -> Result<()> {
    // 2. Resolve newer versions for every recognized declaration
    let github = GitHubClient::new(args.github_token.as_deref()).with_api_url(&args.github_api);
    let resolver = GitHubResolver::new(Arc::new(github));
    let handlers = Handlers::upgrade_set(resolver, maven);
    let edits = handlers.collect(declarations, &args.prefix).await?;

    if edits.is_empty() {
        println!("\n{}", "All dependencies are already up to date!".green());
        return Ok(());
    }

    // 3. Apply or print the edits
    if args.dry_run {
        println!();
        for edit in &edits {
            println!(
                "line {}: {} -> {}",
                edit.line,
                edit.find.red(),
                edit.substitution.green()
            );
        }
        return Ok(());
    }

    replace::rewrite_file(&args.file, &edits)?;
    println!(
        "\nUpdated {} with {} replacement(s)",
        args.file.display(),
        edits.len()
    );
    Ok(())
}

async fn run_license_mode(
    args: &Args,
    declarations: &[Declaration],
    maven: MavenClient,
) -> Result<()> {
    let checker = LicenseChecker::new(maven);
    let rows = checker.report(declarations, &args.prefix, &args.file).await;
    for row in &rows {
        println!("{},{}", row.name, row.license);
    }
    Ok(())
}
