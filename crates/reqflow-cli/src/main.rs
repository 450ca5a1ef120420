//! reqflow command line
//!
//! - `validate <catalog>`: check a catalog file, exit 1 on errors
//! - `report <catalog>`: approvers per system and tasks per request type
//! - `simulate`: run scripted requests through a fresh engine

mod logging;
mod report;
mod simulate;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use reqflow_catalog::CatalogData;
use reqflow_core::EngineConfig;
use report::CatalogReport;
use simulate::{Scenario, Simulator};
use std::path::{Path, PathBuf};

const SAMPLE_CATALOG: &str = include_str!("../../../demos/catalog.toml");

fn cli() -> Command {
    Command::new("reqflow")
        .version(reqflow_core::VERSION)
        .about("HR/IT request lifecycle engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (TOML)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log filter used when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a catalog file for consistency")
                .arg(
                    Arg::new("catalog")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog file (.toml, .yaml or .json)"),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Summarize approvers and generated tasks for a catalog")
                .arg(
                    Arg::new("catalog")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog file (.toml, .yaml or .json)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run scripted requests through the engine")
                .arg(
                    Arg::new("catalog")
                        .long("catalog")
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog file; the bundled sample is used when omitted"),
                )
                .arg(
                    Arg::new("scenario")
                        .long("scenario")
                        .default_value("all")
                        .value_parser(["all", "access", "approval", "rejection", "offboarding"])
                        .help("Scenario to run after onboarding the sample employee"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map_or("warn", String::as_str);
    logging::init(level, matches.get_flag("log-json"))?;

    let config = load_config(matches.get_one::<PathBuf>("config"))?;

    match matches.subcommand() {
        Some(("validate", args)) => {
            let path = catalog_path(args)?;
            let data = read_catalog(path)?;
            let issues = data.validate();
            let errors = issues.iter().filter(|i| i.is_error()).count();
            for issue in &issues {
                let label = if issue.is_error() { "error" } else { "warning" };
                println!("{label}: {issue}");
            }
            println!(
                "{}: {} error(s), {} warning(s)",
                path.display(),
                errors,
                issues.len() - errors
            );
            if errors > 0 {
                std::process::exit(1);
            }
        }
        Some(("report", args)) => {
            let data = read_catalog(catalog_path(args)?)?;
            let report = CatalogReport::build(&data, &config);
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render_text());
            }
        }
        Some(("simulate", args)) => {
            let data = match args.get_one::<PathBuf>("catalog") {
                Some(path) => read_catalog(path)?,
                None => CatalogData::from_toml_str(SAMPLE_CATALOG)?,
            };
            let name = args
                .get_one::<String>("scenario")
                .map_or("all", String::as_str);
            let scenarios = Scenario::parse(name)
                .with_context(|| format!("unknown scenario {name}"))?;

            let simulator = Simulator::new(data, config)?;
            let reports = simulator.run(&scenarios).await?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("{report}");
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading engine config {}", path.display()))?;
    let config = EngineConfig::from_toml_str(&text)
        .with_context(|| format!("parsing engine config {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded engine config");
    Ok(config)
}

fn catalog_path(args: &ArgMatches) -> anyhow::Result<&PathBuf> {
    args.get_one::<PathBuf>("catalog")
        .context("a catalog path is required")
}

fn read_catalog(path: &Path) -> anyhow::Result<CatalogData> {
    CatalogData::read_file(path).with_context(|| format!("loading catalog {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_options_reach_subcommands() {
        let matches = cli()
            .try_get_matches_from(["reqflow", "simulate", "--scenario", "access", "--log-level", "debug"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("log-level").map(String::as_str),
            Some("debug")
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "simulate");
        assert_eq!(
            args.get_one::<String>("scenario").map(String::as_str),
            Some("access")
        );
    }

    #[test]
    fn bundled_catalog_parses() {
        let data = CatalogData::from_toml_str(SAMPLE_CATALOG).unwrap();
        assert!(data.validate().is_empty());
    }
}
