use colored::Colorize;
use wikicrawl::commands::command_argument_builder;
use wikicrawl::handlers::{
    handle_clear, handle_crawl, handle_list, init_tracing, print_banner, report_owns_stdout,
};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet") || report_owns_stdout(&chosen_command);

    init_tracing(chosen_command.get_count("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let outcome = match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        Some(("list", primary_command)) => handle_list(primary_command),
        Some(("clear", primary_command)) => handle_clear(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
