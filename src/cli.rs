use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Correct CSV files with reusable per-column rules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the rules available in the active catalog
    Rules(RulesArgs),
    /// Create or edit a correction profile for a CSV file
    Profile(ProfileArgs),
    /// Apply a profile's correction rules and write the corrected CSV
    Apply(ApplyArgs),
    /// Preview the cell-level changes a profile would make
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Rule catalog YAML file (defaults to the built-in catalog)
    #[arg(short = 'r', long = "rules")]
    pub rules: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Input CSV file whose headers seed a new profile
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Profile YAML file to create or edit
    #[arg(short = 'p', long = "profile")]
    pub profile: PathBuf,
    /// Name recorded when creating a new profile
    #[arg(long)]
    pub name: Option<String>,
    /// Bind a rule to a column, as `column=rule_id` (repeatable)
    #[arg(long = "add-rule", action = clap::ArgAction::Append)]
    pub add_rules: Vec<String>,
    /// Unbind a rule from a column, as `column=rule_id` (repeatable)
    #[arg(long = "remove-rule", action = clap::ArgAction::Append)]
    pub remove_rules: Vec<String>,
    /// Rule catalog YAML file (defaults to the built-in catalog)
    #[arg(short = 'r', long = "rules")]
    pub rules: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Input CSV file to correct
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Correction profile YAML (a rule-free profile is auto-generated when omitted)
    #[arg(short = 'p', long = "profile")]
    pub profile: Option<PathBuf>,
    /// Rule catalog YAML file (defaults to the built-in catalog)
    #[arg(short = 'r', long = "rules")]
    pub rules: Option<PathBuf>,
    /// CSV delimiter character for reading input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Limit number of rows processed
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input CSV file to preview corrections for
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Correction profile YAML (a rule-free profile is auto-generated when omitted)
    #[arg(short = 'p', long = "profile")]
    pub profile: Option<PathBuf>,
    /// Rule catalog YAML file (defaults to the built-in catalog)
    #[arg(short = 'r', long = "rules")]
    pub rules: Option<PathBuf>,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Limit number of rows processed
    #[arg(long)]
    pub limit: Option<usize>,
    /// Emit changes as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
