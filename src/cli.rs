// Command-line surface: the flags and positional search terms. Parsing
// only; `ui::run` decides what to do with them.

use clap::Parser;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Auth resolution order:
  --auth > saved file > $AUTH_HEADER_SOLUTIONS > error

Default store path:
  <config dir>/solutions_search_cli/auth.json

The cookie is stored as plaintext JSON with owner-only permissions.
Treat the file like a password.";

#[derive(Parser, Debug)]
#[command(
    name = "solutions_search_cli",
    version,
    about = "Quick-search users by phone number, id or name",
    after_help = AFTER_HELP
)]
pub struct Cli {
    #[arg(short = 'u', help = "Print only userId results")]
    pub user_id_only: bool,
    #[arg(long, help = "Prompt once for cookie header and save to file")]
    pub login: bool,
    #[arg(long, help = "Delete saved cookie file")]
    pub logout: bool,
    #[arg(
        long,
        value_name = "STR",
        help = "Cookie header to use for this run (e.g. 'JSESSIONID=...; other=...')"
    )]
    pub auth: Option<String>,
    #[arg(long, help = "With --auth, also persist to file")]
    pub save: bool,
    #[arg(long, value_name = "PATH", help = "Override auth store path")]
    pub store: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,
    #[arg(value_name = "TERM", help = "Phone numbers, ids or names to search for")]
    pub terms: Vec<String>,
}
