use serde_json::Value;
use tracing::{debug, info};
use trial_core::errors::{ErrorInfo, TrialError};
use trial_core::Condition;

use crate::resource::ResourceStore;
use crate::selection::{parse_selection, Selection};
use crate::table::{DefaultTableParser, Rows, TableFormat, TableParser};

/// Turns a condition table resource into conditions.
pub struct ConditionImporter<S, P = DefaultTableParser> {
    store: S,
    parser: P,
}

impl<S: ResourceStore> ConditionImporter<S> {
    /// Importer reading from `store` with the default table parser.
    pub fn new(store: S) -> Self {
        Self {
            store,
            parser: DefaultTableParser,
        }
    }
}

impl<S: ResourceStore, P: TableParser> ConditionImporter<S, P> {
    /// Importer with a custom table parser.
    pub fn with_parser(store: S, parser: P) -> Self {
        Self { store, parser }
    }

    /// Resource store the importer reads from.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Imports the data rows of `resource`, restricted to `selection` when given.
    ///
    /// Every failure is reported as [`TrialError::Import`] carrying the
    /// resource name and the phase that failed (`format`, `retrieve`,
    /// `parse`, `header`, `selection`).
    pub fn import_conditions(
        &self,
        resource: &str,
        selection: Option<&Selection>,
    ) -> Result<Vec<Condition>, TrialError> {
        let format = TableFormat::from_resource_name(resource)
            .map_err(|err| TrialError::import(resource, "format", err))?;
        let bytes = self
            .store
            .get_resource(resource)
            .map_err(|err| TrialError::import(resource, "retrieve", err))?;
        let rows = self
            .parser
            .parse_table(&bytes, format)
            .map_err(|err| TrialError::import(resource, "parse", err))?;
        debug!(resource, %format, rows = rows.len(), "decoded condition table");

        let conditions = conditions_from_rows(resource, rows, selection)?;
        info!(
            resource,
            conditions = conditions.len(),
            selection = ?selection.map(ToString::to_string),
            "imported conditions"
        );
        Ok(conditions)
    }
}

/// Zips the header row with each selected data row.
pub fn conditions_from_rows(
    resource: &str,
    rows: Rows,
    selection: Option<&Selection>,
) -> Result<Vec<Condition>, TrialError> {
    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some(header) => header_names(resource, header)?,
        None => {
            return Err(TrialError::import(
                resource,
                "parse",
                "table has no sheets or rows",
            ))
        }
    };
    let data: Vec<Vec<Value>> = rows.collect();

    let indices = match selection {
        Some(selection) => parse_selection(selection, data.len())
            .map_err(|err| TrialError::import(resource, "selection", err))?,
        None => (0..data.len()).collect(),
    };

    let mut conditions = Vec::with_capacity(indices.len());
    for index in indices {
        let row = data.get(index).ok_or_else(|| {
            TrialError::Import(
                ErrorInfo::new("import-selection", "selected row is out of range")
                    .with_context("resource", resource)
                    .with_context("phase", "selection")
                    .with_context("index", index.to_string())
                    .with_context("rows", data.len().to_string()),
            )
        })?;
        let mut values = row.iter().cloned();
        let pairs = header
            .iter()
            .map(|name| (name.clone(), values.next().unwrap_or(Value::Null)));
        let condition = Condition::from_pairs(pairs)
            .map_err(|err| TrialError::import(resource, "header", err))?;
        conditions.push(condition);
    }
    Ok(conditions)
}

/// Reads column names, dropping trailing blank header cells.
fn header_names(resource: &str, mut header: Vec<Value>) -> Result<Vec<String>, TrialError> {
    while matches!(header.last(), Some(Value::Null)) {
        header.pop();
    }
    header
        .into_iter()
        .enumerate()
        .map(|(column, cell)| match cell {
            Value::String(name) => Ok(name.trim().to_string()),
            Value::Null => Err(TrialError::import(
                resource,
                "header",
                format!("column {column} has no name"),
            )),
            other => Ok(other.to_string()),
        })
        .collect()
}
