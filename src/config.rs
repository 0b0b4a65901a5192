//! Command-line options and the runtime settings derived from them.

use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_TOP_ACCOUNTS: usize = 15;
pub const DEFAULT_TOP_OWNERS: usize = 10;

/// Command-line arguments for sales-insights
#[derive(Clone, Parser, Debug)]
#[command(
    name = "sales-insights",
    version,
    about = "Explore a sales opportunity table: stage mix, top accounts, conversion and losses"
)]
pub struct Args {
    /// Opportunity table to open at start-up (.csv, .tsv, .psv, .json, .parquet).
    /// Without it the window starts empty; use File → Open…
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Print every page, computed with its default filters, as JSON and exit
    #[arg(long, requires = "path")]
    pub report: bool,

    /// Number of accounts in the "top accounts" ranking
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TOP_ACCOUNTS)]
    pub top_accounts: usize,

    /// Number of owners in the "top owners" ranking and default owner selection
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TOP_OWNERS)]
    pub top_owners: usize,
}

/// Parameters shared by every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub top_accounts: usize,
    pub top_owners: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_accounts: DEFAULT_TOP_ACCOUNTS,
            top_owners: DEFAULT_TOP_OWNERS,
        }
    }
}

impl From<&Args> for Settings {
    fn from(args: &Args) -> Self {
        Self {
            top_accounts: args.top_accounts,
            top_owners: args.top_owners,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_settings() {
        let args = Args::try_parse_from(["sales-insights"]).unwrap();
        assert_eq!(args.path, None);
        assert!(!args.report);
        assert_eq!(Settings::from(&args), Settings::default());
    }

    #[test]
    fn report_needs_a_path() {
        assert!(Args::try_parse_from(["sales-insights", "--report"]).is_err());

        let args = Args::try_parse_from([
            "sales-insights",
            "opps.csv",
            "--report",
            "--top-accounts",
            "5",
        ])
        .unwrap();
        assert!(args.report);
        assert_eq!(args.path, Some(PathBuf::from("opps.csv")));
        assert_eq!(Settings::from(&args).top_accounts, 5);
        assert_eq!(Settings::from(&args).top_owners, DEFAULT_TOP_OWNERS);
    }
}
