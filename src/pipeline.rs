//! One filter cycle: filter the cached table, project the result, and collect
//! the facts and notices the host displays alongside it.

use std::fmt;

use anyhow::Result;
use log::{debug, info, warn};

use crate::{
    cache::LoadedSource,
    capabilities::SchemaCapabilities,
    data::Table,
    facets::{self, CategoryFacet},
    filter::{self, FilterParameters},
    projector::{self, ExportBlob, ExportOptions, MapOutcome},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    CategoryUnavailable,
    ReviewUnavailable,
    KeywordUnavailable,
    CodeUnavailable,
    CoordinatesUnavailable,
    NoMappablePoints,
    DroppedCoordinates(usize),
}

impl Notice {
    /// Warnings flag filter input that was ignored; everything else is informational.
    pub fn is_warning(&self) -> bool {
        matches!(self, Notice::KeywordUnavailable | Notice::CodeUnavailable)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::CategoryUnavailable => {
                write!(f, "No category column found; category filter omitted")
            }
            Notice::ReviewUnavailable => {
                write!(f, "No review-count column found; review threshold omitted")
            }
            Notice::KeywordUnavailable => {
                write!(f, "No name column found; keyword search ignored")
            }
            Notice::CodeUnavailable => write!(f, "No code column found; code selection ignored"),
            Notice::CoordinatesUnavailable => {
                f.write_str(MapOutcome::Unsupported.reason().unwrap_or_default())
            }
            Notice::NoMappablePoints => {
                f.write_str(MapOutcome::NoMappablePoints.reason().unwrap_or_default())
            }
            Notice::DroppedCoordinates(count) => write!(
                f,
                "{count} row(s) without valid coordinates are listed but not mapped"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub capabilities: SchemaCapabilities,
    pub categories: Vec<CategoryFacet>,
    pub max_review_count: Option<i64>,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub map: MapOutcome,
    pub display: Table,
    pub export: ExportBlob,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    export_options: ExportOptions,
}

impl Pipeline {
    pub fn new(export_options: ExportOptions) -> Self {
        Self { export_options }
    }

    pub fn run(&self, source: &LoadedSource, params: &FilterParameters) -> Result<PipelineOutput> {
        let capabilities = &source.capabilities;
        let notices = capability_notices(capabilities, params);
        let filtered = filter::apply(&source.table, capabilities, params);
        debug!(
            "Filtered {} with {params:?}: {} of {} row(s)",
            source.name,
            filtered.len(),
            source.table.len()
        );
        let projection = projector::project(&filtered, capabilities, self.export_options)?;

        let mut output = PipelineOutput {
            capabilities: capabilities.clone(),
            categories: facets::category_values(&source.table, capabilities),
            max_review_count: facets::max_review_count(&source.table, capabilities),
            total_rows: source.table.len(),
            filtered_rows: filtered.len(),
            map: projection.map,
            display: projection.display,
            export: projection.export,
            notices,
        };
        match &output.map {
            MapOutcome::Unsupported => output.notices.push(Notice::CoordinatesUnavailable),
            MapOutcome::NoMappablePoints => output.notices.push(Notice::NoMappablePoints),
            MapOutcome::Points(points) if points.len() < output.filtered_rows => output
                .notices
                .push(Notice::DroppedCoordinates(output.filtered_rows - points.len())),
            MapOutcome::Points(_) => {}
        }
        for notice in &output.notices {
            if notice.is_warning() {
                warn!("{notice}");
            } else {
                info!("{notice}");
            }
        }
        Ok(output)
    }
}

fn capability_notices(capabilities: &SchemaCapabilities, params: &FilterParameters) -> Vec<Notice> {
    let mut notices = Vec::new();
    if !capabilities.has_category() {
        notices.push(Notice::CategoryUnavailable);
    }
    if !capabilities.has_reviews() {
        notices.push(Notice::ReviewUnavailable);
    }
    if params.active_keyword().is_some() && !capabilities.has_names() {
        notices.push(Notice::KeywordUnavailable);
    }
    if !params.selected_codes.is_empty() && !capabilities.has_codes() {
        notices.push(Notice::CodeUnavailable);
    }
    notices
}
