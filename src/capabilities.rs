//! Header normalization and detection of the optional facility columns.
//!
//! [`normalize`] trims header names and resolves a [`SchemaCapabilities`]
//! snapshot once per load. Downstream stages consult the snapshot instead of
//! probing the table for columns themselves. A missing column is recorded as
//! `None`; it is never an error.

use log::debug;
use serde::Serialize;

use crate::data::Table;

/// Category column tiers, tried in order: classification, POI code, alias name, name.
pub const CATEGORY_CANDIDATES: &[&[&str]] = &[
    &["施設分類", "category"],
    &["POIコード", "poi_code"],
    &["名称_通称", "alias"],
    &["名称", "name"],
];
pub const REVIEW_CANDIDATES: &[&str] = &["reviews", "レビュー数", "review_count"];
pub const COORDINATE_CANDIDATES: &[(&str, &str)] = &[
    ("緯度", "経度"),
    ("lat", "lon"),
    ("latitude", "longitude"),
];
pub const PRIMARY_NAME_CANDIDATES: &[&str] = &["名称", "name"];
pub const ALIAS_NAME_CANDIDATES: &[&str] = &["名称_通称", "alias"];
pub const CODE_CANDIDATES: &[&str] = &["POIコード", "poi_code", "code"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub name: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinateColumns {
    pub latitude: ColumnRef,
    pub longitude: ColumnRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCapabilities {
    pub category_column: Option<ColumnRef>,
    pub review_column: Option<ColumnRef>,
    pub coordinate_columns: Option<CoordinateColumns>,
    pub name_columns: Vec<ColumnRef>,
    pub code_column: Option<ColumnRef>,
}

impl SchemaCapabilities {
    /// Resolves capabilities against headers that have already been trimmed.
    pub fn detect(table: &Table) -> Self {
        let category_column = CATEGORY_CANDIDATES
            .iter()
            .find_map(|tier| first_present(table, tier));
        let coordinate_columns = COORDINATE_CANDIDATES.iter().find_map(|(lat, lon)| {
            Some(CoordinateColumns {
                latitude: column_ref(table, lat)?,
                longitude: column_ref(table, lon)?,
            })
        });
        let name_columns = [PRIMARY_NAME_CANDIDATES, ALIAS_NAME_CANDIDATES]
            .iter()
            .filter_map(|candidates| first_present(table, candidates))
            .collect();

        Self {
            category_column,
            review_column: first_present(table, REVIEW_CANDIDATES),
            coordinate_columns,
            name_columns,
            code_column: first_present(table, CODE_CANDIDATES),
        }
    }

    pub fn has_category(&self) -> bool {
        self.category_column.is_some()
    }

    pub fn has_reviews(&self) -> bool {
        self.review_column.is_some()
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinate_columns.is_some()
    }

    pub fn has_names(&self) -> bool {
        !self.name_columns.is_empty()
    }

    pub fn has_codes(&self) -> bool {
        self.code_column.is_some()
    }

    /// `(capability, resolved column)` pairs for host display.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let describe = |column: &Option<ColumnRef>| {
            column
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "-".to_string())
        };
        let coordinates = self
            .coordinate_columns
            .as_ref()
            .map(|c| format!("{} / {}", c.latitude.name, c.longitude.name))
            .unwrap_or_else(|| "-".to_string());
        let names = if self.name_columns.is_empty() {
            "-".to_string()
        } else {
            self.name_columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        vec![
            ("category", describe(&self.category_column)),
            ("reviews", describe(&self.review_column)),
            ("coordinates", coordinates),
            ("keyword", names),
            ("code", describe(&self.code_column)),
        ]
    }
}

fn column_ref(table: &Table, name: &str) -> Option<ColumnRef> {
    table.column_index(name).map(|index| ColumnRef {
        name: name.to_string(),
        index,
    })
}

fn first_present(table: &Table, candidates: &[&str]) -> Option<ColumnRef> {
    candidates.iter().find_map(|name| column_ref(table, name))
}

/// Trims surrounding whitespace (including stray newlines) from every header,
/// then detects capabilities. Cell values are left untouched.
pub fn normalize(mut table: Table) -> (Table, SchemaCapabilities) {
    for header in &mut table.headers {
        let trimmed = header.trim();
        if trimmed.len() != header.len() {
            *header = trimmed.to_string();
        }
    }
    let capabilities = SchemaCapabilities::detect(&table);
    debug!("Detected capabilities: {capabilities:?}");
    (table, capabilities)
}
