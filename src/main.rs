use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, error};
use repo_summarizer::{
    cli::{self, ConsoleProgress},
    config::{Config, EnvOverrides},
    logging,
    models::RepositoryIdentity,
    pipeline::Pipeline,
    store::{JsonRecordStore, RecordStore},
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/repo-summarizer/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record store location
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace, off)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    summarize: SummarizeArgs,
}

#[derive(clap::Args)]
struct SummarizeArgs {
    /// Repository as owner/repo; prompted for when omitted
    repository: Option<String>,

    /// Branch, tag or commit to read (defaults to the repository's default branch)
    #[arg(long = "ref")]
    git_ref: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a repository and store the result
    Summarize(SummarizeArgs),
    /// Print the latest stored record for a repository
    Show {
        /// Repository as owner/repo
        repository: String,
    },
    /// List stored records whose README excerpt matches a regular expression
    Search {
        pattern: String,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args = Cli::parse();
    logging::init(&args.log_level);

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        cli::print_error(&format!("{:#}", e));
        process::exit(1);
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    debug!("record store at {}", config.database_path.display());

    match args.command {
        Some(Command::Summarize(summarize_args)) => summarize(&config, summarize_args).await,
        None => summarize(&config, args.summarize).await,
        Some(Command::Show { repository }) => show(&config, &repository).await,
        Some(Command::Search { pattern }) => search(&config, &pattern).await,
    }
}

/// Defaults < config file < environment < flags
fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(args.config.as_deref())
        .context("could not load configuration")?
        .apply_env(&EnvOverrides::from_env());

    if let Some(db) = &args.db {
        config.database_path = db.clone();
    }
    Ok(config)
}

async fn summarize(config: &Config, args: SummarizeArgs) -> anyhow::Result<()> {
    let identity = match args.repository {
        Some(input) => input.parse::<RepositoryIdentity>()?,
        None => cli::prompt_repository()?,
    };

    let pipeline = Pipeline::from_config(config)?;
    let progress = ConsoleProgress::new();

    match pipeline.run(&identity, args.git_ref.as_deref(), &progress).await {
        Ok(report) => {
            cli::print_report(&report);
            Ok(())
        }
        Err(e) => {
            progress.clear();
            Err(e).with_context(|| format!("could not summarize {}", identity))
        }
    }
}

async fn show(config: &Config, repository: &str) -> anyhow::Result<()> {
    let identity: RepositoryIdentity = repository.parse()?;
    let store = JsonRecordStore::new(&config.database_path);

    match store.get(&identity).await? {
        Some(record) => cli::print_record(&record),
        None => cli::print_warning(&format!("No stored record for {}", identity)),
    }
    Ok(())
}

async fn search(config: &Config, pattern: &str) -> anyhow::Result<()> {
    let store = JsonRecordStore::new(&config.database_path);
    let hits = store.search(pattern).await?;

    if hits.is_empty() {
        cli::print_warning(&format!("No stored README matches '{}'", pattern));
        return Ok(());
    }
    cli::print_info(&format!("{} matching record(s)", hits.len()));
    for (id, record) in &hits {
        cli::print_search_hit(*id, record);
    }
    Ok(())
}
