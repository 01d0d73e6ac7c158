//! `filter`: one filter cycle driven by command-line flags and an optional
//! parameter file.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cache::SourceCache,
    cli::{FilterArgs, MapFormat},
    config,
    export_options,
    filter::{CategorySelection, FilterOverrides, FilterParameters},
    io_utils, load_input,
    pipeline::{Pipeline, PipelineOutput},
    projector::MapOutcome,
    table,
};

pub fn execute(args: &FilterArgs) -> Result<()> {
    let params = resolve_params(args)?;
    let mut cache = SourceCache::new();
    let source = load_input(&mut cache, &args.input)?;
    let output = Pipeline::new(export_options(&args.output)?).run(&source, &params)?;

    let display_to_stdout = !args.export.as_deref().is_some_and(io_utils::is_dash)
        && !args.map.as_deref().is_some_and(io_utils::is_dash);
    if display_to_stdout {
        print_summary(&output, args.rows);
    }

    if let Some(path) = &args.export {
        io_utils::write_output(path, &output.export.bytes)?;
        info!(
            "Exported {} row(s) to {:?} ({}, {} bytes)",
            output.filtered_rows,
            path,
            output.export.content_type(),
            output.export.len()
        );
    }
    if let Some(path) = &args.map {
        let rendered = match args.map_format {
            MapFormat::Csv => output.map.to_csv()?,
            MapFormat::Json => output.map.to_json()?,
        };
        io_utils::write_output(path, rendered.as_bytes())?;
        info!(
            "Wrote {} map point(s) to {:?}",
            output.map.points().len(),
            path
        );
    }
    Ok(())
}

/// Parameter file values, overridden by any flag given on the command line.
pub fn resolve_params(args: &FilterArgs) -> Result<FilterParameters> {
    let base = match &args.params {
        Some(path) => config::load_params(path)
            .with_context(|| format!("Loading filter parameters from {path:?}"))?,
        None => FilterParameters::default(),
    };
    let codes: BTreeSet<String> = args
        .codes
        .iter()
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect();
    let overrides = FilterOverrides {
        selected_category: args.category.as_deref().map(CategorySelection::parse),
        min_review_count: args.min_reviews,
        keyword: args.keyword.clone(),
        selected_codes: (!args.codes.is_empty()).then_some(codes),
    };
    Ok(base.with_overrides(overrides))
}

fn print_summary(output: &PipelineOutput, rows: usize) {
    println!(
        "{} of {} facilities match",
        output.filtered_rows, output.total_rows
    );
    match &output.map {
        MapOutcome::Points(points) => println!("map: {} point(s)", points.len()),
        other => println!("map: {}", other.reason().unwrap_or_default()),
    }
    println!();
    print!("{}", table::render_data_table(&output.display, rows));
    if rows > 0 && output.display.len() > rows {
        println!("... {} more row(s)", output.display.len() - rows);
    }
}
