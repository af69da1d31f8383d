pub mod apply;
pub mod catalog;
pub mod cli;
pub mod data;
pub mod engine;
pub mod error;
pub mod io_utils;
pub mod preview;
pub mod profile;
pub mod profile_cmd;
pub mod rows;
pub mod table;
pub mod transform;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::catalog::RuleCatalog;
use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_correct", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Rules(args) => handle_rules(&args),
        Commands::Profile(args) => profile_cmd::execute(&args),
        Commands::Apply(args) => apply::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

fn handle_rules(args: &cli::RulesArgs) -> Result<()> {
    let catalog = load_catalog(args.rules.as_deref())?;
    let headers = vec![
        "id".to_string(),
        "description".to_string(),
        "conditional".to_string(),
    ];
    let rows: Vec<Vec<String>> = catalog
        .rules
        .iter()
        .map(|rule| {
            vec![
                rule.id.to_string(),
                rule.description.clone(),
                if rule.condition.is_some() { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
    info!("Listed {} rule(s)", catalog.len());
    Ok(())
}

pub(crate) fn load_catalog(path: Option<&Path>) -> Result<RuleCatalog> {
    match path {
        Some(path) => {
            RuleCatalog::load(path).with_context(|| format!("Loading rule catalog {path:?}"))
        }
        None => Ok(RuleCatalog::builtin()),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
