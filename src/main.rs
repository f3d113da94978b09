use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use dcrepo::config::{self, StoreConfig};
use dcrepo::feed::{FeedParser, ModuleMap};
use dcrepo::logging;
use dcrepo::repository::{FeedReader, JsonModuleList, RepositoryManager, ReqwestClient};

#[derive(Parser)]
#[command(name = "dcrepo")]
#[command(version, about = "Browse and install modules from a Dotclear repository feed")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository feed URL
    #[arg(long, global = true)]
    feed_url: Option<String>,

    /// Version of the running core
    #[arg(long, global = true)]
    core_version: Option<String>,

    /// Keep modules regardless of their minimum core version
    #[arg(long, global = true)]
    dev: bool,

    /// Cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Disable the feed cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// JSON file listing installed and disabled modules
    #[arg(long, global = true)]
    modules: Option<PathBuf>,

    /// User agent sent with every request
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the repository and print a summary
    Check {
        /// Ignore the cached feed
        #[arg(long)]
        force: bool,
    },
    /// List new modules, or available updates
    List {
        #[arg(long)]
        updates: bool,
    },
    /// Search new modules
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Download a package
    Download { url: String, dest: PathBuf },
}

impl Cli {
    fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration {:?}", path))?,
            None => StoreConfig::default(),
        };

        if let Some(url) = &self.feed_url {
            config.feed_url = Some(url.clone());
        }
        if let Some(version) = &self.core_version {
            config.core_version = Some(version.clone());
        }
        if self.dev {
            config.dev_mode = true;
        }
        if let Some(user_agent) = &self.user_agent {
            config.reader.user_agent = user_agent.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.reader.cache_dir = Some(dir.clone());
        }
        if self.no_cache {
            config.reader.cache_dir = None;
        } else if config.reader.cache_dir.is_none() {
            let dir = config::cache_dir();
            match std::fs::create_dir_all(&dir) {
                Ok(()) => config.reader.cache_dir = Some(dir),
                Err(e) => debug!("Default cache directory {:?} unavailable: {}", dir, e),
            }
        }

        Ok(config)
    }

    fn module_list(&self) -> anyhow::Result<JsonModuleList> {
        match &self.modules {
            Some(path) => JsonModuleList::from_file(path)
                .with_context(|| format!("Failed to load module list {:?}", path)),
            None => Ok(JsonModuleList::default()),
        }
    }
}

fn build_manager(cli: &Cli) -> anyhow::Result<RepositoryManager> {
    let config = cli.store_config()?;
    let modules = Arc::new(cli.module_list()?);

    let parser = match cli.command {
        // Downloads never read the feed
        Command::Download { .. } => FeedParser::new("", true),
        _ => config.feed_parser()?,
    };
    let client = Arc::new(ReqwestClient::new()?);
    let reader = FeedReader::new(&config.reader, parser, client)?;

    Ok(RepositoryManager::new(
        config.feed_url.clone(),
        reader,
        modules.clone(),
        modules,
    )
    .with_download_timeout(config.download_timeout()))
}

fn print_modules(modules: &ModuleMap, updates: bool) {
    for (id, module) in modules {
        let version = match (&module.current_version, updates) {
            (Some(current), true) => format!("{} -> {}", current, module.version),
            _ => module.version.clone(),
        };
        let section = module.section.as_deref().unwrap_or("-");
        let tags = module.tags_label();
        match module.accuracy {
            Some(accuracy) => println!(
                "{id}\t{version}\t{}\t{section}\t{tags}\t[{accuracy}]",
                module.label()
            ),
            None => println!("{id}\t{version}\t{}\t{section}\t{tags}", module.label()),
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut manager = build_manager(&cli)?;

    match &cli.command {
        Command::Check { force } => {
            if !manager.check(*force).await {
                anyhow::bail!("Repository feed could not be read");
            }
            println!(
                "{} new modules, {} updates",
                manager.get(false).len(),
                manager.get(true).len()
            );
        }
        Command::List { updates } => {
            if !manager.check(false).await {
                anyhow::bail!("Repository feed could not be read");
            }
            print_modules(manager.get(*updates), *updates);
        }
        Command::Search { query } => {
            if !manager.check(false).await {
                anyhow::bail!("Repository feed could not be read");
            }
            print_modules(&manager.search(&query.join(" ")), false);
        }
        Command::Download { url, dest } => {
            manager.download(url, dest).await?;
            println!("Downloaded {} to {}", url, dest.display());
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(&config::log_path(), cli.verbose)
        .context("Failed to initialize logging")?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
