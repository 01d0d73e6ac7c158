pub mod batch;
pub mod cache;
pub mod capabilities;
pub mod cli;
pub mod config;
pub mod data;
pub mod facets;
pub mod filter;
pub mod inspect;
pub mod io_utils;
pub mod pipeline;
pub mod projector;
pub mod search;
pub mod source;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cache::{LoadedSource, SourceCache},
    cli::{Cli, Commands, ExportArgs, InputArgs},
    projector::ExportOptions,
    source::SourceOptions,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("facility_filter", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect(args) => inspect::execute(&args),
        Commands::Filter(args) => search::execute(&args),
        Commands::Batch(args) => batch::execute(&args),
    }
}

pub(crate) fn source_options(args: &InputArgs) -> Result<SourceOptions> {
    Ok(SourceOptions {
        delimiter: io_utils::resolve_input_delimiter(&args.input, args.delimiter),
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    })
}

pub(crate) fn export_options(args: &ExportArgs) -> Result<ExportOptions> {
    Ok(ExportOptions {
        delimiter: args
            .output_delimiter
            .unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
        encoding: io_utils::resolve_encoding(args.output_encoding.as_deref())?,
        bom: args.bom,
    })
}

pub(crate) fn load_input(
    cache: &mut SourceCache,
    args: &InputArgs,
) -> Result<std::sync::Arc<LoadedSource>> {
    let options = source_options(args)?;
    info!(
        "Loading '{}' with delimiter '{}' ({})",
        args.input.display(),
        printable_delimiter(options.delimiter),
        options.encoding.name()
    );
    cache
        .load_path(&args.input, options)
        .with_context(|| format!("Loading facilities from {:?}", args.input))
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
