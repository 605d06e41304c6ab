//! Config subcommand handlers.

use postview_config::{self as config, Config};

use super::output_format;
use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: write the defaults ────────────────────────────────
        ConfigCommand::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let written = config::save_config(&Config::default())?;
            if !global.quiet {
                eprintln!("Wrote default configuration to {}", written.display());
            }
            Ok(())
        }

        // ── Show: resolved file + env ───────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let format = output_format(global, &cfg);
            let out = output::render_single(&format, &cfg, |c| {
                Ok(toml::to_string_pretty(c)?.trim_end().to_owned())
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
