use std::process::exit;

use colored::Colorize;

fn main() {
    if let Err(e) = housing_lookup::app::run_cli() {
        eprintln!("{} {}", "error:".red().bold(), e);
        exit(1);
    }
}
