//! Command dispatch: bridges CLI args -> core controllers -> output formatting.

pub mod cache;
pub mod config_cmd;
pub mod posts;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::debug;

use postview_config::Config;
use postview_core::{CachedFetcher, DataCache, FeedConfig, MemoryCache, RedbCache};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Everything a feed command needs, resolved from config file, environment
/// and global flags (flags win).
#[derive(Debug)]
pub struct Context {
    pub feed: FeedConfig,
    pub format: OutputFormat,
    pub cache_path: PathBuf,
    /// `--no-cache` or `[cache] enabled = false`.
    pub memory_only: bool,
    pub quiet: bool,
}

impl Context {
    pub fn resolve(global: &GlobalOpts) -> Result<Self, CliError> {
        let mut config = postview_config::load_config_or_default();

        if let Some(ref url) = global.base_url {
            config.api.base_url.clone_from(url);
        }
        if let Some(timeout) = global.timeout {
            config.api.timeout = timeout;
        }

        let feed = config.to_feed_config()?;
        let format = output_format(global, &config);
        let cache_path = global
            .cache_path
            .clone()
            .unwrap_or_else(|| config.cache_path());
        let memory_only = global.no_cache || !config.cache.enabled;

        Ok(Self {
            feed,
            format,
            cache_path,
            memory_only,
            quiet: global.quiet,
        })
    }

    /// Open and initialise the page cache this run should use.
    pub async fn open_cache(&self) -> Result<Arc<dyn DataCache>, CliError> {
        let cache: Arc<dyn DataCache> = if self.memory_only {
            debug!("using in-memory page cache");
            Arc::new(MemoryCache::new())
        } else {
            debug!(path = %self.cache_path.display(), "using persistent page cache");
            Arc::new(RedbCache::new(&self.cache_path))
        };
        cache.init().await?;
        Ok(cache)
    }

    pub async fn fetcher(&self) -> Result<Arc<CachedFetcher>, CliError> {
        let cache = self.open_cache().await?;
        let client = self.feed.page_client()?;
        Ok(Arc::new(CachedFetcher::new(client, cache)?))
    }
}

/// `--output` if given, else `[defaults] output`, else table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.clone().unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// Dispatch a feed or cache command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Posts(args) => posts::handle(ctx, &args).await,
        Command::Users => users::handle(ctx).await,
        Command::Cache(args) => cache::handle(ctx, &args.command).await,
        // Config and Completions are handled before a Context exists
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are dispatched directly".into(),
        )),
    }
}
