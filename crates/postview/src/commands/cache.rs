//! `postview cache`: inspect or clear the persistent page cache.

use serde::Serialize;

use super::Context;
use crate::cli::CacheCommand;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CacheStats {
    path: String,
    persistent: bool,
    entries: usize,
    size_bytes: u64,
}

fn detail(stats: &CacheStats) -> String {
    let backend = if stats.persistent { "redb" } else { "memory (disabled)" };
    format!(
        "Path:     {}\nBackend:  {backend}\nEntries:  {}\nSize:     {} bytes",
        stats.path, stats.entries, stats.size_bytes
    )
}

pub async fn handle(ctx: &Context, command: &CacheCommand) -> Result<(), CliError> {
    match command {
        CacheCommand::Path => {
            output::print_output(&ctx.cache_path.display().to_string(), ctx.quiet);
            Ok(())
        }

        CacheCommand::Clear => {
            if ctx.memory_only {
                if !ctx.quiet {
                    eprintln!("Persistent cache is disabled; nothing to clear");
                }
                return Ok(());
            }

            let cache = ctx.open_cache().await?;
            let removed = cache.entry_count().await?;
            cache.clear().await?;

            if !ctx.quiet {
                eprintln!(
                    "Cleared {removed} cached page(s) from {}",
                    ctx.cache_path.display()
                );
            }
            Ok(())
        }

        CacheCommand::Stats => {
            let cache = ctx.open_cache().await?;
            let entries = cache.entry_count().await?;
            let size_bytes = if ctx.memory_only {
                0
            } else {
                std::fs::metadata(&ctx.cache_path).map_or(0, |m| m.len())
            };

            let stats = CacheStats {
                path: ctx.cache_path.display().to_string(),
                persistent: !ctx.memory_only,
                entries,
                size_bytes,
            };
            let out = output::render_single(&ctx.format, &stats, |s| Ok(detail(s)))?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }
    }
}
