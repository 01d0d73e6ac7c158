use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Filter, map and export public facility datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report which filters a facility file supports, its categories and review range
    Inspect(InspectArgs),
    /// Filter facilities and print, map or export the result
    Filter(FilterArgs),
    /// Run several named filter queries from a YAML/JSON file against one load
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input facility CSV file ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Maximum category values to display (0 = all)
    #[arg(long, default_value_t = 0)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Character encoding for exported CSV (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Delimiter for exported CSV (defaults to ',')
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Prefix UTF-8 exports with a byte order mark for spreadsheet tools
    #[arg(long)]
    pub bom: bool,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// YAML or JSON file with filter parameters; flags below override it
    #[arg(short = 'p', long = "params")]
    pub params: Option<PathBuf>,
    /// Exact category value to keep ('全て' disables the filter)
    #[arg(short = 'c', long)]
    pub category: Option<String>,
    /// Minimum review count (inclusive)
    #[arg(long = "min-reviews")]
    pub min_reviews: Option<i64>,
    /// Case-insensitive substring searched in the name columns
    #[arg(short = 'k', long)]
    pub keyword: Option<String>,
    /// Code values to keep (repeatable or comma-separated)
    #[arg(long = "code", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub codes: Vec<String>,
    /// Number of rows to print (0 = all)
    #[arg(long, default_value_t = 20)]
    pub rows: usize,
    /// Write the filtered rows as CSV to this path ('-' for stdout)
    #[arg(short = 'o', long = "export")]
    pub export: Option<PathBuf>,
    /// Write map points to this path ('-' for stdout)
    #[arg(long)]
    pub map: Option<PathBuf>,
    /// Format for --map output
    #[arg(long = "map-format", value_enum, default_value = "csv")]
    pub map_format: MapFormat,
    #[command(flatten)]
    pub output: ExportArgs,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// YAML or JSON file listing named queries
    #[arg(short = 'q', long = "queries")]
    pub queries: PathBuf,
    /// Directory receiving one `<query>.csv` export per query
    #[arg(long = "export-dir")]
    pub export_dir: Option<PathBuf>,
    #[command(flatten)]
    pub output: ExportArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum MapFormat {
    #[default]
    Csv,
    Json,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_single_ascii() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("、").is_err());
    }

    #[test]
    fn filter_flags_parse() {
        let cli = Cli::try_parse_from([
            "facility-filter",
            "filter",
            "-i",
            "facilities.csv",
            "--category",
            "公園",
            "--min-reviews",
            "10",
            "--code",
            "1101,1203",
            "--code",
            "1301",
        ])
        .unwrap();
        let Commands::Filter(args) = cli.command else {
            panic!("expected filter command");
        };
        assert_eq!(args.category.as_deref(), Some("公園"));
        assert_eq!(args.min_reviews, Some(10));
        assert_eq!(args.codes, vec!["1101", "1203", "1301"]);
        assert_eq!(args.rows, 20);
        assert_eq!(args.map_format, MapFormat::Csv);
    }
}
