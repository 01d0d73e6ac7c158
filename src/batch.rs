//! `batch`: many named queries against a single cached load.

use std::fs;

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::info;

use crate::{
    cache::SourceCache, cli::BatchArgs, config::QueryFile, export_options, io_utils, load_input,
    pipeline::Pipeline, table,
};

pub fn execute(args: &BatchArgs) -> Result<()> {
    if io_utils::is_dash(&args.input.input) {
        bail!("batch reads its input once per query and requires a file path, not stdin");
    }
    let queries = QueryFile::load(&args.queries)?;
    let pipeline = Pipeline::new(export_options(&args.output)?);
    if let Some(dir) = &args.export_dir {
        fs::create_dir_all(dir).with_context(|| format!("Creating export directory {dir:?}"))?;
    }

    let mut cache = SourceCache::new();
    let mut rows = Vec::with_capacity(queries.queries.len());
    for query in &queries.queries {
        let source = load_input(&mut cache, &args.input)?;
        let output = pipeline
            .run(&source, &query.params)
            .with_context(|| format!("Running query '{}'", query.name))?;

        if let Some(dir) = &args.export_dir {
            let path = dir.join(format!("{}.csv", query.name.trim()));
            io_utils::write_output(&path, &output.export.bytes)?;
            info!(
                "Query '{}': exported {} row(s) to {:?}",
                query.name, output.filtered_rows, path
            );
        }

        let notices = output.notices.iter().join("; ");
        rows.push(vec![
            query.name.clone(),
            output.filtered_rows.to_string(),
            output.map.points().len().to_string(),
            notices,
        ]);
    }

    let headers = vec![
        "query".to_string(),
        "rows".to_string(),
        "map points".to_string(),
        "notices".to_string(),
    ];
    table::print_table(&headers, &rows);
    let stats = cache.stats();
    info!(
        "Ran {} quer(ies) with {} load(s) and {} cache hit(s)",
        rows.len(),
        stats.misses,
        stats.hits
    );
    Ok(())
}
