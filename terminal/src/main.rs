use clap::Parser;
use lostpage_terminal::Cli;
use lostpage_terminal::run_main;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    run_main(Cli::parse())
}
