use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    capabilities::SchemaCapabilities,
    data::{Table, coerce_cell},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFacet {
    pub value: String,
    pub count: usize,
}

/// Distinct non-null category values sorted by value, with their occurrence counts.
pub fn category_values(table: &Table, capabilities: &SchemaCapabilities) -> Vec<CategoryFacet> {
    let Some(column) = capabilities.category_column.as_ref() else {
        return Vec::new();
    };
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in 0..table.len() {
        if let Some(value) = table.cell(row, column.index) {
            *counts.entry(value).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(value, count)| CategoryFacet {
            value: value.to_string(),
            count,
        })
        .collect()
}

/// Largest numeric review count, truncated to an integer.
pub fn max_review_count(table: &Table, capabilities: &SchemaCapabilities) -> Option<i64> {
    let column = capabilities.review_column.as_ref()?;
    (0..table.len())
        .filter_map(|row| coerce_cell(table.cell(row, column.index)))
        .max_by(f64::total_cmp)
        .map(|max| max.trunc() as i64)
}

/// Facets ordered by descending count then value, limited to `top` entries (0 = all).
pub fn top_categories(facets: &[CategoryFacet], top: usize) -> Vec<CategoryFacet> {
    let mut items = facets.to_vec();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    if top > 0 && items.len() > top {
        items.truncate(top);
    }
    items
}

/// Renders facets as `[value, count, percent]` rows relative to `total` rows.
pub fn render_rows(facets: &[CategoryFacet], total: usize) -> Vec<Vec<String>> {
    facets
        .iter()
        .map(|facet| {
            let percent = if total == 0 {
                0.0
            } else {
                (facet.count as f64 / total as f64) * 100.0
            };
            vec![
                facet.value.clone(),
                facet.count.to_string(),
                format!("{percent:.2}%"),
            ]
        })
        .collect()
}
