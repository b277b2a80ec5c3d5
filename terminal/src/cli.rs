use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(version, about = "A page that was never there, booting and crashing in your terminal")]
pub struct Cli {
    /// Skip the animation and show the final error screen.
    #[arg(long = "reduced-motion")]
    pub reduced_motion: bool,

    /// Configuration file. Defaults to `$XDG_CONFIG_HOME/lostpage/config.toml`.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON file with timing, DOM and connection facts to narrate.
    #[arg(long, value_name = "FILE", conflicts_with = "probe")]
    pub context: Option<PathBuf>,

    /// Fetch this URL and narrate the real request.
    #[arg(long, value_name = "URL")]
    pub probe: Option<String>,

    /// Seed for the glitch pattern and the final error screen.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn context_and_probe_conflict() {
        let err = Cli::try_parse_from([
            "lostpage",
            "--context",
            "facts.json",
            "--probe",
            "https://example.com",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from(["lostpage", "--reduced-motion", "--seed", "7"])
            .expect("parse");
        assert!(cli.reduced_motion);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.probe, None);
    }
}
