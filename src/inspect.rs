//! `inspect`: which filter controls a file supports, plus the facts needed to
//! populate them (category values and the review-count range).

use anyhow::Result;
use log::info;

use crate::{cache::SourceCache, cli::InspectArgs, facets, load_input, table};

pub fn execute(args: &InspectArgs) -> Result<()> {
    let mut cache = SourceCache::new();
    let source = load_input(&mut cache, &args.input)?;
    let capabilities = &source.capabilities;

    let headers = vec!["capability".to_string(), "column".to_string()];
    let rows = capabilities
        .summary()
        .into_iter()
        .map(|(name, column)| vec![name.to_string(), column])
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);

    println!();
    println!("rows: {}", source.table.len());
    match facets::max_review_count(&source.table, capabilities) {
        Some(max) => println!("max reviews: {max}"),
        None => println!("max reviews: -"),
    }

    if let Some(column) = capabilities.category_column.as_ref() {
        let categories = facets::category_values(&source.table, capabilities);
        let top = facets::top_categories(&categories, args.top);
        println!();
        let headers = vec![
            column.name.clone(),
            "count".to_string(),
            "percent".to_string(),
        ];
        table::print_table(&headers, &facets::render_rows(&top, source.table.len()));
        info!(
            "Listed {} of {} category value(s) from '{}'",
            top.len(),
            categories.len(),
            column.name
        );
    } else {
        info!("No category column found; category filter unavailable");
    }
    Ok(())
}
