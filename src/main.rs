use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mozi::batch::{analyze_repository, BatchOptions};
use mozi::config::Config;
use mozi::github::{self, GitHubClient, RepoRef};
use mozi::report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mozi",
    about = "Rank a repository's open issues by how fixable they look",
    version,
    args_conflicts_with_subcommands = true
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Repository as owner/repo or a github.com URL (defaults to this checkout's remote)
    repo: Option<String>,

    /// How many issues to list under recommended fixes
    top: Option<usize>,

    /// Issues analyzed at once (1 = sequential, gentlest on rate limits)
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Per-issue time limit for gathering evidence, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Also write results as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Directory for the saved text report
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Don't save the text report to a file
    #[arg(long)]
    no_save: bool,

    /// Use this config file instead of the default location
    #[arg(long = "config", value_name = "PATH")]
    config_file: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the config file location, creating it with defaults if missing
    Config,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mozi=info" } else { "mozi=warn" };
    let filter = EnvFilter::try_from_env("MOZI_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_repo(arg: Option<&str>) -> Result<RepoRef> {
    match arg {
        Some(input) => github::parse_repo_reference(input).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid repository '{}'. Use owner/repo or a full GitHub URL",
                input
            )
        }),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            github::get_remote_info(&cwd)
        }
    }
}

fn run_config_command(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => Config::config_path().context("Could not determine config directory")?,
    };
    if path.exists() {
        println!("Config: {}", path.display());
        return Ok(());
    }
    Config::default()
        .save_to(&path)
        .map_err(|e| anyhow::anyhow!(e))?;
    println!("Created default config at {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Some(Command::Config) = args.command {
        return run_config_command(args.config_file);
    }

    let mut config = match &args.config_file {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.issue_timeout_secs = Some(timeout);
    }
    if let Some(top) = args.top {
        if top == 0 {
            anyhow::bail!("Top recommended count must be a positive number");
        }
        config.top_recommended = top;
    }
    if let Some(dir) = args.output_dir.clone() {
        config.output_dir = Some(dir);
    }
    config.sanitize();

    let repo = resolve_repo(args.repo.as_deref())?;
    let token = config.github_token().ok_or_else(|| {
        anyhow::anyhow!(
            "GITHUB_TOKEN is required. Export a personal access token or set github_token in {}",
            Config::config_location()
        )
    })?;

    eprintln!("🔍 Analyzing repository: {}", repo);
    let client = GitHubClient::new(repo.clone(), token, &config)?;
    let batch = analyze_repository(&client, &BatchOptions::from(&config)).await?;
    eprintln!(
        "📋 Analyzed {} open issues in {:.1}s",
        batch.analyzed.len(),
        batch.duration.as_secs_f64()
    );

    let text = report::render_text(&batch, &repo, config.top_recommended);
    println!("{}", text);

    if !args.no_save {
        let dir = match &config.output_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        let path = report::save_text(&dir, &repo, &text)?;
        eprintln!("📄 Full analysis saved to: {}", path.display());
    }

    if let Some(path) = &args.json {
        report::save_json(path, &batch.analyzed)?;
        eprintln!("🗂  JSON results saved to: {}", path.display());
    }

    Ok(())
}
