use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;

use crate::rank::RankLookup;
use crate::view::RenderedPage;

const HOUSE_WIDTH: usize = 32;
const OWNER_WIDTH: usize = 18;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn fit(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len <= width {
        let mut out = value.to_string();
        out.push_str(&" ".repeat(width - len));
        return out;
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn render_text(page: &RenderedPage) -> String {
    let mut out = String::new();
    let header = format!(
        "   {}  {}  {:>9}  {:>7}",
        fit("House", HOUSE_WIDTH),
        fit("Owner", OWNER_WIDTH),
        "Cookies",
        "Players"
    );
    out.push_str(&header.bold().to_string());
    out.push('\n');

    if page.rows.is_empty() {
        out.push_str(&"   no houses to show".dimmed().to_string());
        out.push('\n');
    }
    for row in page.rows.iter() {
        out.push_str(&format!(
            "🏠 {}  {}  🍪{:>7}  👥{:>5}\n",
            fit(&row.house, HOUSE_WIDTH),
            fit(&row.owner, OWNER_WIDTH).cyan(),
            row.cookies,
            row.players
        ));
    }

    let p = &page.pagination;
    let mut nav: Vec<String> = Vec::new();
    if p.prev_enabled {
        nav.push("[p] prev".to_string());
    }
    if p.next_enabled {
        nav.push("[n] next".to_string());
    }
    out.push_str(&format!(
        "{} ({} houses)  {}\n",
        p.label().bold(),
        page.total_records,
        nav.iter().join("  ").dimmed()
    ));
    out
}

pub fn render_json(page: &RenderedPage) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(page).unwrap_or_else(|_| b"{}".to_vec());
    out.push(b'\n');
    out
}

pub fn print_page(format: OutputFormat, page: &RenderedPage) {
    match format {
        OutputFormat::Text => print!("{}", render_text(page)),
        OutputFormat::Json => print!("{}", String::from_utf8_lossy(&render_json(page))),
    }
}

pub fn render_rank(player: &str, rank: &RankLookup) -> String {
    let shown = match rank {
        RankLookup::Found(_) => rank.to_string().green().bold(),
        RankLookup::NotFound => rank.to_string().yellow(),
        RankLookup::Failed => rank.to_string().red(),
    };
    format!("{player}'s Rank: {shown}")
}

/// Spinner + bar shown while the gate is blocked.
pub fn countdown_bar(seconds: u32, message: String) -> ProgressBar {
    let pb = ProgressBar::new(u64::from(seconds));
    let style = ProgressStyle::with_template("{spinner:.yellow} {msg}\n  [{bar:40.yellow/white}]")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}
