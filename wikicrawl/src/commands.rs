use crate::handlers::parse_seed;
use clap::{Arg, ArgAction, arg, command};
use wikicrawl_core::crawl::DEFAULT_DB_NAME;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn db_arg() -> Arg {
    arg!(-d --"db" <PATH>)
        .required(false)
        .help("Location of the SQLite link store")
        .default_value(DEFAULT_DB_NAME)
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikicrawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikicrawl")
        .about("Collects every Wikipedia article reachable from a seed page within a depth bound")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .required(false)
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about("Crawl outward from a seed article and record every visited URL")
                .arg(
                    arg!(<URL>)
                        .required(true)
                        .help("The seed article URL")
                        .value_parser(parse_seed),
                )
                .arg(db_arg())
                .arg(
                    arg!(--"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum number of link hops from the seed")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("6"),
                )
                .arg(
                    arg!(-t --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of concurrent fetch workers (1 keeps strict breadth-first order)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"max-pages" <COUNT>)
                        .required(false)
                        .help("Stop after visiting this many pages and save what was found")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"fresh")
                        .required(false)
                        .help("Clear the link store before crawling")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("list")
                .about("Print every URL in the link store")
                .arg(db_arg()),
        )
        .subcommand(
            command!("clear")
                .about("Remove every URL from the link store")
                .arg(db_arg()),
        )
}
