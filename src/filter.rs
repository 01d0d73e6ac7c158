use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    capabilities::SchemaCapabilities,
    data::{Table, coerce_cell},
};

/// Tokens that mean "no category filter". Matched exactly after trimming.
const ALL_TOKENS: &[&str] = &["全て", "すべて"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategorySelection {
    #[default]
    All,
    Exact(String),
}

impl CategorySelection {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || ALL_TOKENS.contains(&trimmed) {
            CategorySelection::All
        } else {
            CategorySelection::Exact(raw.to_string())
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            CategorySelection::All => None,
            CategorySelection::Exact(value) => Some(value.as_str()),
        }
    }
}

impl fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategorySelection::All => f.write_str(ALL_TOKENS[0]),
            CategorySelection::Exact(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for CategorySelection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CategorySelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(CategorySelection::parse(&raw))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterParameters {
    #[serde(alias = "category")]
    pub selected_category: CategorySelection,
    #[serde(alias = "min_reviews")]
    pub min_review_count: Option<i64>,
    pub keyword: Option<String>,
    #[serde(alias = "codes")]
    pub selected_codes: BTreeSet<String>,
}

impl FilterParameters {
    /// The keyword, or `None` when it is unset or blank.
    pub fn active_keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
    }

    pub fn is_unset(&self) -> bool {
        self.selected_category == CategorySelection::All
            && self.min_review_count.is_none()
            && self.active_keyword().is_none()
            && self.selected_codes.is_empty()
    }

    /// Replaces every field the overrides carry, even when the new value is
    /// `All` or a blank keyword.
    pub fn with_overrides(self, overrides: FilterOverrides) -> Self {
        let FilterOverrides {
            selected_category,
            min_review_count,
            keyword,
            selected_codes,
        } = overrides;
        FilterParameters {
            selected_category: selected_category.unwrap_or(self.selected_category),
            min_review_count: min_review_count.or(self.min_review_count),
            keyword: keyword.or(self.keyword),
            selected_codes: selected_codes.unwrap_or(self.selected_codes),
        }
    }
}

/// Values given explicitly on the command line. `None` keeps the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOverrides {
    pub selected_category: Option<CategorySelection>,
    pub min_review_count: Option<i64>,
    pub keyword: Option<String>,
    pub selected_codes: Option<BTreeSet<String>>,
}

#[derive(Debug)]
enum Predicate<'a> {
    CategoryEquals { column: usize, value: &'a str },
    MinReviews { column: usize, threshold: f64 },
    Keyword { columns: Vec<usize>, needle: String },
    CodeIn { column: usize, codes: &'a BTreeSet<String> },
}

impl Predicate<'_> {
    fn matches(&self, table: &Table, row: usize) -> bool {
        match self {
            Predicate::CategoryEquals { column, value } => {
                table.cell(row, *column) == Some(*value)
            }
            Predicate::MinReviews { column, threshold } => {
                coerce_cell(table.cell(row, *column)).is_some_and(|reviews| reviews >= *threshold)
            }
            Predicate::Keyword { columns, needle } => columns.iter().any(|&column| {
                table
                    .cell(row, column)
                    .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
            }),
            Predicate::CodeIn { column, codes } => table
                .cell(row, *column)
                .is_some_and(|code| codes.contains(code)),
        }
    }
}

/// Builds the enabled predicates, skipping any whose column is absent or whose
/// parameter is unset.
fn build_predicates<'a>(
    capabilities: &SchemaCapabilities,
    params: &'a FilterParameters,
) -> Vec<Predicate<'a>> {
    let mut predicates = Vec::new();
    if let (Some(column), Some(value)) = (
        capabilities.category_column.as_ref(),
        params.selected_category.value(),
    ) {
        predicates.push(Predicate::CategoryEquals {
            column: column.index,
            value,
        });
    }
    if let (Some(column), Some(threshold)) =
        (capabilities.review_column.as_ref(), params.min_review_count)
    {
        predicates.push(Predicate::MinReviews {
            column: column.index,
            threshold: threshold as f64,
        });
    }
    if let Some(keyword) = params.active_keyword()
        && capabilities.has_names()
    {
        predicates.push(Predicate::Keyword {
            columns: capabilities.name_columns.iter().map(|c| c.index).collect(),
            needle: keyword.to_lowercase(),
        });
    }
    if let Some(column) = capabilities.code_column.as_ref()
        && !params.selected_codes.is_empty()
    {
        predicates.push(Predicate::CodeIn {
            column: column.index,
            codes: &params.selected_codes,
        });
    }
    predicates
}

/// Indices of the rows satisfying every enabled predicate, in table order.
pub fn matching_rows(
    table: &Table,
    capabilities: &SchemaCapabilities,
    params: &FilterParameters,
) -> Vec<usize> {
    let predicates = build_predicates(capabilities, params);
    (0..table.len())
        .filter(|&row| predicates.iter().all(|p| p.matches(table, row)))
        .collect()
}

/// Returns the filtered table. With no enabled predicate the input is cloned as is.
pub fn apply(table: &Table, capabilities: &SchemaCapabilities, params: &FilterParameters) -> Table {
    if build_predicates(capabilities, params).is_empty() {
        return table.clone();
    }
    let rows = matching_rows(table, capabilities, params);
    table.select_rows(&rows)
}
