use std::path::PathBuf;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::ProgressBar;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::api::{
    self, ApiError, HousingSource, HttpSettings, HypixelClient, MojangClient, PlayerSource,
    ProfileLookup,
};
use crate::cli::args::CliArgs;
use crate::cli::commands::{Command, HELP};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::controller::{Controller, Outcome};
use crate::limiter::{
    lock_gate, shared, Countdown, CountdownEvent, CounterDecay, PersistentCounter, RateLimitGate,
    SharedGate, DEFAULT_THRESHOLD,
};
use crate::model::SortKey;
use crate::names::NameResolver;
use crate::output::{self, OutputFormat};
use crate::rank::lookup_rank;
use crate::storage::{JsonFileStore, MemoryStore};
use crate::store::DataStore;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no Hypixel API key, pass --api-key or set {}", config::API_KEY_ENV)]
    MissingApiKey,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Blocked(String),

    #[error("failed to fetch active houses: {0}")]
    Fetch(String),
}

fn print_banner() {
    const BANNER: &str = r#"
  _                    _
 | |_  ___ _  _ ___ __(_)_ _  __ _
 | ' \/ _ \ || (_-<(_-< | ' \/ _` |
 |_||_\___/\_,_/__/__/_|_||_\__, |  lookup
                            |___/
"#;
    print!("{}", BANNER);
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    api_key: Option<String>,
    hypixel_url: String,
    profile_url: String,
    http: HttpSettings,
    threshold: u32,
    lookup_rate: u32,
    state_file: Option<PathBuf>,
    sort: SortKey,
    search: Option<String>,
    page: Option<usize>,
    output_format: OutputFormat,
    once: bool,
    rank: Option<String>,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(
    args: CliArgs,
    cfg: ConfigFile,
    env_api_key: Option<String>,
) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let api_key = args
        .api_key
        .or(env_api_key)
        .or(cfg.api_key)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    let hypixel_url = args
        .hypixel_url
        .or(cfg.hypixel_url)
        .unwrap_or_else(|| api::DEFAULT_HYPIXEL_URL.to_string());
    let profile_url = args
        .profile_url
        .or(cfg.profile_url)
        .unwrap_or_else(|| api::DEFAULT_PROFILE_URL.to_string());
    for url in [&hypixel_url, &profile_url] {
        reqwest::Url::parse(url).map_err(|e| format!("invalid URL '{url}': {e}"))?;
    }

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let proxy = args
        .proxy
        .or(cfg.proxy)
        .filter(|p| !p.trim().is_empty());

    let threshold = args.threshold.or(cfg.threshold).unwrap_or(DEFAULT_THRESHOLD);
    if threshold == 0 {
        return Err("invalid threshold, expected positive integer".to_string());
    }
    let lookup_rate = args.lookup_rate.or(cfg.lookup_rate).unwrap_or(10);
    if lookup_rate == 0 {
        return Err("invalid lookup-rate, expected positive integer".to_string());
    }

    let persist = !args.no_persist && cfg.persist.unwrap_or(true);
    let state_file = if persist {
        Some(
            args.state_file
                .or(cfg.state_file)
                .map(|p| config::expand_tilde(&p))
                .unwrap_or_else(config::default_state_path),
        )
    } else {
        None
    };

    let sort_raw = args.sort.or(cfg.sort).unwrap_or_default();
    let sort = SortKey::parse(&sort_raw)
        .ok_or_else(|| format!("invalid sort '{sort_raw}', expected none, cookies or players"))?;

    let search = args
        .search
        .or(cfg.search)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let format_raw = args
        .output_format
        .or(cfg.output_format)
        .unwrap_or_else(|| "text".to_string());
    let output_format = OutputFormat::parse(&format_raw)
        .ok_or_else(|| format!("invalid output format '{format_raw}', expected text or json"))?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    Ok(RunConfig {
        api_key,
        hypixel_url,
        profile_url,
        http: HttpSettings {
            timeout_seconds: timeout,
            proxy,
        },
        threshold,
        lookup_rate,
        state_file,
        sort,
        search,
        page: args.page,
        output_format,
        once: args.once,
        rank: args.rank.map(|r| r.trim().to_string()),
        no_color,
        verbose: args.verbose,
    })
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Countdown task plus the bar that mirrors it on screen.
struct CountdownDisplay {
    countdown: Countdown,
    bar: Option<ProgressBar>,
    total: u32,
    tx: mpsc::Sender<CountdownEvent>,
}

impl CountdownDisplay {
    fn new(tx: mpsc::Sender<CountdownEvent>) -> Self {
        Self {
            countdown: Countdown::default(),
            bar: None,
            total: 0,
            tx,
        }
    }

    fn start(&mut self, gate: &SharedGate) {
        if self.countdown.is_running() {
            return;
        }
        let (seconds, message) = {
            let gate = lock_gate(gate);
            (gate.seconds_remaining(), gate.message())
        };
        self.total = seconds;
        self.bar = Some(output::countdown_bar(seconds, message));
        self.countdown.start(gate.clone(), self.tx.clone());
    }

    fn tick(&self, seconds_remaining: u32, message: String) {
        if let Some(pb) = self.bar.as_ref() {
            pb.set_position(u64::from(self.total.saturating_sub(seconds_remaining)));
            pb.set_message(message);
        }
    }

    fn finish(&mut self) {
        self.countdown.cancel();
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }

    fn say(&self, line: &str) {
        match self.bar.as_ref() {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

/// Prints an outcome. Returns true when the gate is blocked.
fn show_outcome(outcome: &Outcome, format: OutputFormat) -> bool {
    match outcome {
        Outcome::Rendered(page) => {
            output::print_page(format, page);
            false
        }
        Outcome::Blocked { message, .. } => {
            println!("{}", message.yellow().bold());
            true
        }
        Outcome::FetchFailed { reason, page } => {
            eprintln!("{} {}", "could not load houses:".red().bold(), reason);
            output::print_page(format, page);
            false
        }
    }
}

async fn first_outcome<H, L>(controller: &mut Controller<H, L>, page: Option<usize>) -> Outcome
where
    H: HousingSource,
    L: ProfileLookup,
{
    match (controller.load().await, page) {
        (Outcome::Rendered(_), Some(page)) => Outcome::Rendered(controller.goto_page(page).await),
        (outcome, _) => outcome,
    }
}

async fn run_session<H, L, P>(
    mut controller: Controller<H, L>,
    players: &P,
    run: &RunConfig,
) -> Result<(), AppError>
where
    H: HousingSource,
    L: ProfileLookup,
    P: PlayerSource,
{
    let format = run.output_format;
    let gate = controller.gate().clone();
    let (tx, mut rx) = mpsc::channel::<CountdownEvent>(16);
    let mut display = CountdownDisplay::new(tx);

    let outcome = first_outcome(&mut controller, run.page).await;
    if show_outcome(&outcome, format) {
        display.start(&gate);
    }
    if format == OutputFormat::Text {
        println!("{}", "type 'help' for commands".dimmed());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Command::Quit => break,
                    Command::Empty => {}
                    Command::Next => output::print_page(format, &controller.next_page().await),
                    Command::Prev => output::print_page(format, &controller.prev_page().await),
                    Command::Page(page) => {
                        output::print_page(format, &controller.goto_page(page).await)
                    }
                    Command::Sort(key) => output::print_page(format, &controller.sort(key).await),
                    Command::Search(term) => {
                        output::print_page(format, &controller.search(&term).await)
                    }
                    Command::Clear => output::print_page(format, &controller.clear_search().await),
                    Command::Refresh => {
                        let outcome = controller.load().await;
                        if show_outcome(&outcome, format) {
                            display.start(&gate);
                        }
                    }
                    Command::Rank(name) => {
                        let rank = lookup_rank(players, &name).await;
                        display.say(&output::render_rank(&name, &rank));
                    }
                    Command::Status => {
                        let gate = lock_gate(&gate);
                        display.say(&format!(
                            "calls: {}/{}  blocked: {}  owners cached: {}",
                            gate.counter().get(),
                            gate.threshold(),
                            format_bool(gate.is_blocked()),
                            controller.names().len()
                        ));
                    }
                    Command::Help => display.say(HELP.trim_end()),
                    Command::Invalid(reason) => display.say(&reason.yellow().to_string()),
                }
            }
            Some(event) = rx.recv() => match event {
                CountdownEvent::Tick { seconds_remaining } => {
                    let message = lock_gate(&gate).message();
                    display.tick(seconds_remaining, message);
                }
                CountdownEvent::Expired => {
                    display.finish();
                    info!("countdown over, reloading");
                    println!("{}", "limit lifted, reloading".green());
                    let outcome = first_outcome(&mut controller, None).await;
                    if show_outcome(&outcome, format) {
                        display.start(&gate);
                    }
                }
            }
        }
    }

    display.finish();
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), AppError> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let http = api::build_http_client(&run.http)?;
    let api_key = run.api_key.clone().ok_or(AppError::MissingApiKey)?;
    let hypixel = HypixelClient::new(http.clone(), &run.hypixel_url, &api_key);

    if let Some(player) = run.rank.as_deref() {
        let rank = lookup_rank(&hypixel, player).await;
        println!("{}", output::render_rank(player, &rank));
        return Ok(());
    }

    let counter = match run.state_file.as_ref() {
        Some(path) => {
            debug!(path = %path.display(), "using persisted call counter");
            PersistentCounter::new(JsonFileStore::new(path))
        }
        None => PersistentCounter::new(MemoryStore::new()),
    };
    let gate = shared(RateLimitGate::new(counter.clone(), run.threshold));

    let mut store = DataStore::new();
    store.sort_by(run.sort);
    if let Some(term) = run.search.as_deref() {
        store.filter(term);
    }

    let names = NameResolver::with_rate(MojangClient::new(http, &run.profile_url), run.lookup_rate);
    let mut controller = Controller::new(hypixel.clone(), names, store, gate);

    if run.once {
        return match first_outcome(&mut controller, run.page).await {
            Outcome::Rendered(page) => {
                output::print_page(run.output_format, &page);
                Ok(())
            }
            Outcome::Blocked { message, .. } => Err(AppError::Blocked(message)),
            Outcome::FetchFailed { reason, .. } => Err(AppError::Fetch(reason)),
        };
    }

    if run.output_format == OutputFormat::Text {
        print_banner();
        format_kv_line("Sort", run.sort.label());
        format_kv_line("Search", run.search.as_deref().unwrap_or("-"));
        format_kv_line("Limit", &format!("{} calls", run.threshold));
        format_kv_line(
            "State",
            &run.state_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "memory".to_string()),
        );
        format_kv_line("Calls", &counter.get().to_string());
        println!();
    }

    let _decay = CounterDecay::start(counter);
    run_session(controller, &hypixel, &run).await
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{}", e.render());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    if args.init_config {
        let path = user_config_path
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine a config path, pass --config".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!("config: {}", path.display());
        return Ok(());
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg, config::env_api_key())?;
    init_logging(run.verbose);
    debug!(
        threshold = run.threshold,
        lookup_rate = run.lookup_rate,
        sort = %run.sort,
        persist = run.state_file.is_some(),
        "run config"
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["housing-lookup"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults() {
        let run = build_run_config(args(&[]), ConfigFile::default(), None).unwrap();
        assert_eq!(run.threshold, 6);
        assert_eq!(run.lookup_rate, 10);
        assert_eq!(run.sort, SortKey::None);
        assert_eq!(run.output_format, OutputFormat::Text);
        assert_eq!(run.hypixel_url, api::DEFAULT_HYPIXEL_URL);
        assert!(run.state_file.is_some());
        assert!(run.api_key.is_none());
    }

    #[test]
    fn cli_beats_env_beats_config() {
        let cfg = ConfigFile {
            api_key: Some("from-config".to_string()),
            threshold: Some(3),
            ..ConfigFile::default()
        };
        let run = build_run_config(args(&[]), cfg.clone(), Some("from-env".to_string())).unwrap();
        assert_eq!(run.api_key.as_deref(), Some("from-env"));
        assert_eq!(run.threshold, 3);

        let run = build_run_config(
            args(&["--api-key", "from-cli", "--threshold", "9"]),
            cfg.clone(),
            Some("from-env".to_string()),
        )
        .unwrap();
        assert_eq!(run.api_key.as_deref(), Some("from-cli"));
        assert_eq!(run.threshold, 9);

        let run = build_run_config(args(&[]), cfg, None).unwrap();
        assert_eq!(run.api_key.as_deref(), Some("from-config"));
    }

    #[test]
    fn no_persist_drops_state_file() {
        let run = build_run_config(args(&["--no-persist"]), ConfigFile::default(), None).unwrap();
        assert!(run.state_file.is_none());

        let cfg = ConfigFile {
            persist: Some(false),
            ..ConfigFile::default()
        };
        let run = build_run_config(args(&[]), cfg, None).unwrap();
        assert!(run.state_file.is_none());
    }

    #[test]
    fn search_is_normalized() {
        let run =
            build_run_config(args(&["--search", "  SkyBlock "]), ConfigFile::default(), None)
                .unwrap();
        assert_eq!(run.search.as_deref(), Some("skyblock"));
    }

    #[test]
    fn bad_config_values_are_rejected() {
        let cfg = ConfigFile {
            sort: Some("size".to_string()),
            ..ConfigFile::default()
        };
        assert!(build_run_config(args(&[]), cfg, None).is_err());

        let cfg = ConfigFile {
            hypixel_url: Some("not a url".to_string()),
            ..ConfigFile::default()
        };
        assert!(build_run_config(args(&[]), cfg, None).is_err());
    }
}
