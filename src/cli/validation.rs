use crate::cli::args::CliArgs;
use crate::model::SortKey;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(threshold) = args.threshold {
        if threshold == 0 {
            return Err("invalid threshold, expected positive integer".to_string());
        }
    }
    if let Some(rate) = args.lookup_rate {
        if rate == 0 {
            return Err("invalid lookup-rate, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid page, pages start at 1".to_string());
        }
    }
    if let Some(raw) = args.sort.as_deref() {
        SortKey::parse(raw)
            .ok_or_else(|| format!("invalid --sort '{raw}', expected none, cookies or players"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text or json"))?;
    }
    if let Some(name) = args.rank.as_deref() {
        if name.trim().is_empty() {
            return Err("please enter a Minecraft username".to_string());
        }
    }
    if args.no_persist && args.state_file.is_some() {
        return Err("use either --state-file or --no-persist, not both".to_string());
    }
    Ok(())
}
