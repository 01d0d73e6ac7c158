//! Filter parameter and query files.
//!
//! Files are parsed as YAML; JSON documents are accepted too since YAML is a
//! superset of JSON.
//!
//! ```yaml
//! queries:
//!   - name: parks
//!     params:
//!       category: 公園
//!       min_reviews: 10
//!   - name: halls
//!     params:
//!       keyword: hall
//! ```

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::filter::FilterParameters;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NamedQuery {
    pub name: String,
    #[serde(default)]
    pub params: FilterParameters,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct QueryFile {
    pub queries: Vec<NamedQuery>,
}

impl QueryFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file: QueryFile = load_from_path(path)?;
        file.validate()
            .with_context(|| format!("Validating queries in {path:?}"))?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        if self.queries.is_empty() {
            bail!("No queries defined");
        }
        let mut seen = HashSet::new();
        for query in &self.queries {
            let name = query.name.trim();
            if name.is_empty() {
                bail!("Query names cannot be empty");
            }
            if name.contains(['/', '\\']) {
                bail!("Query name '{name}' cannot contain path separators");
            }
            if !seen.insert(name) {
                bail!("Duplicate query name '{name}'");
            }
        }
        Ok(())
    }
}

pub fn load_params(path: &Path) -> Result<FilterParameters> {
    load_from_path(path)
}

pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("Opening YAML file {path:?}"))?;
    parse_str(&raw).with_context(|| format!("Parsing {path:?}"))
}

pub fn parse_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    Ok(serde_yaml::from_str(input)?)
}
