//! Inbound boundary for map loaders.
//!
//! A loader hands over a [`ScenarioDefinition`]; each seed becomes one
//! registration. Rejected seeds are logged and skipped so that one bad entry
//! never aborts a load.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    cold_data::ColdDataCache,
    state::ProvinceId,
    store::{ProvinceStore, StoreError},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceSeed {
    pub id: ProvinceId,
    #[serde(default)]
    pub terrain: u16,
    #[serde(default)]
    pub owner: Option<u16>,
    #[serde(default)]
    pub controller: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub provinces: Vec<ProvinceSeed>,
}

impl ScenarioDefinition {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ScenarioDefinition::from_json_str(&contents)
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read scenario from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub registered: usize,
    pub skipped: Vec<(ProvinceId, StoreError)>,
}

/// Registers every seed in order. Names go to the cold cache, owner and
/// controller are applied after registration.
pub fn apply_scenario(
    store: &mut ProvinceStore,
    cold: &mut ColdDataCache,
    scenario: &ScenarioDefinition,
) -> LoadSummary {
    let mut summary = LoadSummary::default();

    for seed in &scenario.provinces {
        if let Err(err) = store.add_province(seed.id, seed.terrain) {
            warn!(
                target: "province_core::scenario",
                province = seed.id,
                error = %err,
                "scenario.seed_skipped"
            );
            summary.skipped.push((seed.id, err));
            continue;
        }
        if let Some(owner) = seed.owner {
            store.set_owner(seed.id, owner);
        }
        if let Some(controller) = seed.controller {
            store.set_controller(seed.id, controller);
        }
        if let Some(name) = &seed.name {
            cold.get_or_create(seed.id).name = name.clone();
        }
        summary.registered += 1;
    }

    info!(
        target: "province_core::scenario",
        registered = summary.registered,
        skipped = summary.skipped.len(),
        version = store.state_version(),
        "scenario.applied"
    );
    summary
}
