//! Terminal front-end for the lostpage 404 sequence.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod app;
mod cli;
pub mod key_hint;
pub mod keymap;
mod logging;
pub mod probe;
pub mod render;
mod tui;

use std::time::Instant;

use color_eyre::eyre::WrapErr;
use lostpage_engine::{AppConfig, ConfigLoader, Context, FileFlagStore, VERSION};
use rand::Rng;

pub use app::App;
pub use cli::Cli;

pub fn run_main(cli: Cli) -> color_eyre::Result<()> {
    let config = load_config(&cli)?;
    let _log_guard = logging::init(&config)?;
    tracing::info!(version = VERSION, reduced_motion = config.display.reduced_motion, "starting");

    let context = load_context(&cli)?;
    let state_file = config.state_file()?;
    let store = FileFlagStore::new(state_file);
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    tracing::debug!(seed, "seeded");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let now = Instant::now();
    let mut app = App::new(&config, context, store, seed, now);
    app.mount(now);
    let result = tui::run(&mut terminal, &mut app);
    app.unmount();
    tui::restore(&mut terminal)?;
    result?;
    Ok(())
}

fn load_config(cli: &Cli) -> color_eyre::Result<AppConfig> {
    let loader = ConfigLoader::new();
    let mut config = match &cli.config {
        Some(path) => loader.with_file(path).load()?,
        None => ConfigLoader::load_default()?,
    };
    if cli.reduced_motion {
        config.display.reduced_motion = true;
    }
    Ok(config)
}

/// `--probe` beats `--context`; with neither, the built-in sample is used.
/// A failed probe is logged and replaced by the sample.
fn load_context(cli: &Cli) -> color_eyre::Result<Context> {
    if let Some(url) = &cli.probe {
        return Ok(match probe::probe(url) {
            Ok(context) => context,
            Err(err) => {
                tracing::warn!(url = %url, "probe failed, using sample context: {err}");
                Context::sample()
            }
        });
    }
    if let Some(path) = &cli.context {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading context file {}", path.display()))?;
        return Context::from_json(&raw)
            .wrap_err_with(|| format!("parsing context file {}", path.display()));
    }
    Ok(Context::sample())
}
