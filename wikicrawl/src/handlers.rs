use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{Level, warn};
use url::Url;
use wikicrawl_core::crawl::{
    CrawlOptions, CrawlSummary, DEFAULT_DB_NAME, execute_crawl, generate_crawl_report,
};
use wikicrawl_core::data::LinkStore;
use wikicrawl_scanner::CancellationToken;

/// Parse a seed URL argument, adding `https://` when the scheme is missing.
pub fn parse_seed(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&candidate).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}' in '{}'", url.scheme(), raw));
    }
    if url.host_str().is_none() {
        return Err(format!("URL '{}' has no host", raw));
    }

    Ok(url.to_string())
}

/// Expand `~` in a store path.
pub fn resolve_db_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

fn db_path_from_args(args: &ArgMatches) -> PathBuf {
    let raw = args
        .get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or(DEFAULT_DB_NAME);
    resolve_db_path(raw)
}

pub fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(verbosity_level(verbose))
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_banner() {
    println!(
        "{} {}",
        "wikicrawl".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
}

/// Build crawl options from the `crawl` subcommand's arguments.
pub fn crawl_options_from_args(args: &ArgMatches) -> Result<CrawlOptions> {
    let seed = args
        .get_one::<String>("URL")
        .ok_or_else(|| anyhow!("a seed URL is required"))?
        .clone();

    let defaults = CrawlOptions::default();
    Ok(CrawlOptions {
        seed,
        db_path: db_path_from_args(args),
        max_depth: args
            .get_one::<usize>("depth")
            .copied()
            .unwrap_or(defaults.max_depth),
        workers: args
            .get_one::<usize>("workers")
            .copied()
            .unwrap_or(defaults.workers),
        max_pages: args.get_one::<usize>("max-pages").copied(),
        timeout_secs: args
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(defaults.timeout_secs),
        fresh: args.get_flag("fresh"),
        show_progress_bars: false,
    })
}

/// True when the report itself goes to stdout in a machine-readable format,
/// in which case nothing else may be printed there.
pub fn report_owns_stdout(matches: &ArgMatches) -> bool {
    match matches.subcommand() {
        Some(("crawl", args)) => {
            args.get_one::<String>("format").map(String::as_str) == Some("json")
                && args.get_one::<PathBuf>("output").is_none()
        }
        _ => false,
    }
}

pub fn render_summary(summary: &CrawlSummary, format: &str) -> Result<String> {
    match format {
        "text" => Ok(generate_crawl_report(summary)),
        "json" => summary.to_json().context("could not serialize crawl summary"),
        other => bail!("unknown report format '{}'", other),
    }
}

/// Status lines are printed unless `--quiet` is set or a JSON report is
/// written to stdout.
fn prints_status(quiet: bool, format: &str, output: Option<&PathBuf>) -> bool {
    !quiet && !(format == "json" && output.is_none())
}

/// Writes the rendered report to `output` (or to `out` when no path is given)
/// followed by the closing status line.
pub fn write_crawl_outcome<W: Write>(
    out: &mut W,
    summary: &CrawlSummary,
    format: &str,
    output: Option<&PathBuf>,
    quiet: bool,
) -> Result<()> {
    let chatty = prints_status(quiet, format, output);
    let rendered = render_summary(summary, format)?;

    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            if chatty {
                writeln!(
                    out,
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                )?;
            }
        }
        None => write!(out, "{}", rendered)?,
    }

    if chatty {
        let status = if summary.cancelled {
            "Crawl interrupted, progress saved".yellow().bold()
        } else {
            "Crawl complete!".green().bold()
        };
        writeln!(out, "\n{} {}", "✓".green().bold(), status)?;
    }

    Ok(())
}

pub async fn handle_crawl(args: &ArgMatches, quiet: bool) -> Result<()> {
    let mut options = crawl_options_from_args(args)?;
    options.show_progress_bars = !quiet;

    let format = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let output = args.get_one::<PathBuf>("output");

    if prints_status(quiet, format, output) {
        println!("\n{} {}", "Crawling".bright_white().bold(), options.seed);
        println!("{} Store: {}", "→".blue(), options.db_path.display());
        println!("{} Max depth: {}", "→".blue(), options.max_depth);
        println!("{} Workers: {}", "→".blue(), options.workers.max(1));
        if let Some(cap) = options.max_pages {
            println!("{} Page cap: {}", "→".blue(), cap);
        }
        if options.fresh {
            println!("{} Clearing existing links first", "→".blue());
        }
        println!();
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, saving links visited so far");
            interrupt.cancel();
        }
    });

    let summary = execute_crawl(options, cancel)
        .await
        .context("crawl failed")?;

    write_crawl_outcome(&mut io::stdout().lock(), &summary, format, output, quiet)
}

fn open_existing_store(args: &ArgMatches) -> Result<(PathBuf, LinkStore)> {
    let db_path = db_path_from_args(args);
    if !LinkStore::exists(&db_path) {
        bail!("no link store at {}", db_path.display());
    }
    let store = LinkStore::open(&db_path)
        .with_context(|| format!("failed to open link store {}", db_path.display()))?;
    Ok((db_path, store))
}

pub fn handle_list(args: &ArgMatches) -> Result<()> {
    let (db_path, store) = open_existing_store(args)?;

    let urls = store.urls()?;
    for url in &urls {
        println!("{}", url);
    }
    eprintln!("{} {} links in {}", "→".blue(), urls.len(), db_path.display());

    store.close()?;
    Ok(())
}

pub fn handle_clear(args: &ArgMatches) -> Result<()> {
    let (db_path, store) = open_existing_store(args)?;

    let removed = store.clear()?;
    println!(
        "{} Removed {} links from {}",
        "✓".green().bold(),
        removed,
        db_path.display().to_string().bright_white()
    );

    store.close()?;
    Ok(())
}
