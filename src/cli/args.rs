use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "housing-lookup",
    version,
    about = "browse active Hypixel houses from the terminal",
    long_about = "housing-lookup lists active Hypixel houses with their owners, cookies and players.\nFetches are counted locally; after too many in a short time the session waits out a countdown before reloading.\n\nExamples:\n  housing-lookup -k <API_KEY>\n  housing-lookup --sort cookies --search parkour --once\n  housing-lookup --rank Technoblade\n\nTip: put the API key in ~/.housing-lookup/config.yml or HYPIXEL_API_KEY."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "How pages are printed: text or json."
    )]
    pub output_format: Option<String>,

    #[arg(
        long = "once",
        help_heading = "Output",
        help = "Print the selected page once and exit instead of starting a session."
    )]
    pub once: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.housing-lookup/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'k',
        long = "ak",
        visible_alias = "api-key",
        value_name = "KEY",
        help_heading = "API",
        help = "Hypixel API key (falls back to HYPIXEL_API_KEY)."
    )]
    pub api_key: Option<String>,

    #[arg(
        long = "hu",
        visible_alias = "hypixel-url",
        value_name = "URL",
        help_heading = "API",
        help = "Base URL of the Hypixel API."
    )]
    pub hypixel_url: Option<String>,

    #[arg(
        long = "pu",
        visible_alias = "profile-url",
        value_name = "URL",
        help_heading = "API",
        help = "Base URL for owner profile lookups (<URL>/<identifier>)."
    )]
    pub profile_url: Option<String>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'l',
        long = "th",
        visible_alias = "threshold",
        value_name = "N",
        help_heading = "Rate limit",
        help = "Fetches allowed before the countdown starts."
    )]
    pub threshold: Option<u32>,

    #[arg(
        short = 'r',
        long = "lr",
        visible_alias = "lookup-rate",
        value_name = "RPS",
        help_heading = "Rate limit",
        help = "Owner name lookups per second."
    )]
    pub lookup_rate: Option<u32>,

    #[arg(
        long = "sf",
        visible_alias = "state-file",
        value_name = "FILE",
        help_heading = "Rate limit",
        help = "Where the call counter is kept (defaults to ~/.housing-lookup/state.json)."
    )]
    pub state_file: Option<String>,

    #[arg(
        long = "np",
        visible_alias = "no-persist",
        help_heading = "Rate limit",
        help = "Keep the call counter in memory only."
    )]
    pub no_persist: bool,

    #[arg(
        short = 's',
        long = "srt",
        visible_alias = "sort",
        value_name = "KEY",
        help_heading = "View",
        help = "Initial sort: none, cookies or players."
    )]
    pub sort: Option<String>,

    #[arg(
        short = 'q',
        long = "sr",
        visible_alias = "search",
        value_name = "TERM",
        help_heading = "View",
        help = "Initial search term (case-insensitive, formatting codes ignored)."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'P',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "View",
        help = "Initial page (1-based)."
    )]
    pub page: Option<usize>,

    #[arg(
        short = 'R',
        long = "rk",
        visible_alias = "rank",
        value_name = "PLAYER",
        help_heading = "Rank",
        help = "Look up a player's rank and exit."
    )]
    pub rank: Option<String>,
}
