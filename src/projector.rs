//! Turns a filtered [`Table`] into what the host draws: map points, a display
//! projection and a CSV export.

use anyhow::Result;
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

use crate::{
    capabilities::SchemaCapabilities,
    data::{Table, coerce_cell},
    io_utils,
};

pub const EXPORT_CONTENT_TYPE: &str = "text/csv";
pub const EXPORT_FILE_NAME: &str = "filtered_facilities.csv";

/// Preferred display columns, in order. English equivalents share a slot with
/// their localized counterpart.
pub const DISPLAY_COLUMNS: &[&[&str]] = &[
    &["名称", "name"],
    &["名称_通称", "alias"],
    &["施設分類", "category"],
    &["POIコード", "poi_code"],
    &["住所", "address"],
    &["電話番号", "phone"],
    &["URL", "url"],
    &["reviews", "レビュー数", "review_count"],
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    /// Row index within the filtered table.
    pub row: usize,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    /// No coordinate columns exist in the source.
    Unsupported,
    /// Coordinate columns exist but no filtered row coerces to numbers.
    NoMappablePoints,
    Points(Vec<MapPoint>),
}

impl MapOutcome {
    pub fn points(&self) -> &[MapPoint] {
        match self {
            MapOutcome::Points(points) => points,
            _ => &[],
        }
    }

    /// Host message for the two empty cases.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            MapOutcome::Unsupported => {
                Some("Latitude/longitude columns are unavailable; the map cannot be shown.")
            }
            MapOutcome::NoMappablePoints => {
                Some("No filtered facility has valid coordinates to plot.")
            }
            MapOutcome::Points(_) => None,
        }
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = io_utils::csv_writer(Vec::new(), b',');
        writer.write_record(["lat", "lon", "label"])?;
        for point in self.points() {
            writer.write_record([
                point.lat.to_string(),
                point.lon.to_string(),
                point.label.clone().unwrap_or_default(),
            ])?;
        }
        io_utils::finish_csv(writer)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.points())?)
    }
}

pub fn map_points(filtered: &Table, capabilities: &SchemaCapabilities) -> MapOutcome {
    let Some(coordinates) = capabilities.coordinate_columns.as_ref() else {
        return MapOutcome::Unsupported;
    };
    let points: Vec<MapPoint> = (0..filtered.len())
        .filter_map(|row| {
            let lat = coerce_cell(filtered.cell(row, coordinates.latitude.index))?;
            let lon = coerce_cell(filtered.cell(row, coordinates.longitude.index))?;
            let label = capabilities
                .name_columns
                .iter()
                .find_map(|column| filtered.cell(row, column.index))
                .map(str::to_string);
            Some(MapPoint {
                row,
                lat,
                lon,
                label,
            })
        })
        .collect();
    if points.is_empty() {
        MapOutcome::NoMappablePoints
    } else {
        MapOutcome::Points(points)
    }
}

/// Column indices for the display projection: the preferred columns present in
/// `table`, or every column when none of them are.
pub fn display_columns(table: &Table) -> Vec<usize> {
    let preferred: Vec<usize> = DISPLAY_COLUMNS
        .iter()
        .filter_map(|slot| slot.iter().find_map(|name| table.column_index(name)))
        .collect();
    if preferred.is_empty() {
        (0..table.headers.len()).collect()
    } else {
        preferred
    }
}

pub fn display_projection(filtered: &Table) -> Table {
    filtered.select_columns(&display_columns(filtered))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBlob {
    pub bytes: Vec<u8>,
    file_name: String,
}

impl ExportBlob {
    pub fn content_type(&self) -> &'static str {
        EXPORT_CONTENT_TYPE
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    pub bom: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
            bom: false,
        }
    }
}

/// Serializes every column of `filtered`. Null cells become empty fields.
pub fn export(filtered: &Table, options: ExportOptions) -> Result<ExportBlob> {
    let mut writer = io_utils::csv_writer(Vec::new(), options.delimiter);
    writer.write_record(&filtered.headers)?;
    for row in filtered.display_rows() {
        writer.write_record(&row)?;
    }
    let text = io_utils::finish_csv(writer)?;
    Ok(ExportBlob {
        bytes: io_utils::encode_text(&text, options.encoding, options.bom)?,
        file_name: EXPORT_FILE_NAME.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct Projection {
    pub map: MapOutcome,
    pub display: Table,
    pub export: ExportBlob,
}

pub fn project(
    filtered: &Table,
    capabilities: &SchemaCapabilities,
    options: ExportOptions,
) -> Result<Projection> {
    Ok(Projection {
        map: map_points(filtered, capabilities),
        display: display_projection(filtered),
        export: export(filtered, options)?,
    })
}
