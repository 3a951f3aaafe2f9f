//! Data validation utilities.

use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;
use zombie_core::config::CoreConfig;
use zombie_core::data::BlueprintRegistry;
use zombie_core::error::GameError;

/// Errors reported by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file failed to load or parse.
    #[error(transparent)]
    Core(#[from] GameError),

    /// Files loaded but their contents are inconsistent.
    #[error("{} problem(s) found", .0.len())]
    Problems(Vec<String>),
}

/// Summary of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Building blueprints loaded.
    pub buildings: usize,
    /// Unit blueprints loaded.
    pub units: usize,
}

/// Validate all RON data files in a directory, optionally against a config.
///
/// # Errors
///
/// Returns an error if any data file fails to parse, or lists every
/// problem found in the parsed data.
pub fn validate_data_directory(path: &Path, config: Option<&CoreConfig>) -> Result<ValidationReport, ToolError> {
    let registry = BlueprintRegistry::load_dir(path)?;
    let mut problems = registry.validate();
    if let Some(config) = config {
        problems.extend(cross_check(&registry, config));
    }

    if !problems.is_empty() {
        for problem in &problems {
            tracing::warn!(%problem, "Data problem");
        }
        return Err(ToolError::Problems(problems));
    }

    Ok(ValidationReport {
        buildings: registry.buildings().count(),
        units: registry.units().count(),
    })
}

/// Resources that cost something but can never be obtained.
#[must_use]
pub fn cross_check(registry: &BlueprintRegistry, config: &CoreConfig) -> Vec<String> {
    let mut obtainable: BTreeSet<&str> = config.starting_resources.keys().map(String::as_str).collect();
    for building in registry.buildings() {
        obtainable.extend(building.production.iter().map(|rule| rule.resource.as_str()));
    }

    let mut problems = Vec::new();
    let costs = registry
        .buildings()
        .map(|b| ("building", b.id.as_str(), &b.costs))
        .chain(registry.units().map(|u| ("unit", u.id.as_str(), &u.costs)));
    for (kind, id, costs) in costs {
        for cost in costs {
            if cost.amount > 0 && !obtainable.contains(cost.resource.as_str()) {
                problems.push(format!(
                    "{kind} '{id}': costs {} which is neither a starting resource nor produced",
                    cost.resource
                ));
            }
        }
    }
    problems
}
