#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use province_core::{ProvinceStore, ScenarioDefinition};

static INIT: Once = Once::new();

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = fixture_path("test_store_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test store config at {}",
            config_path.display()
        );

        std::env::set_var("PROVINCE_STORE_CONFIG_PATH", &config_path);
    });
}

pub fn baltic_scenario() -> ScenarioDefinition {
    ScenarioDefinition::from_file(&fixture_path("baltic_scenario.json"))
        .expect("baltic scenario fixture")
}

/// One mutation in a replayable command log.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    Add { id: u16, terrain: u16 },
    Owner { id: u16, owner: u16 },
    Controller { id: u16, controller: u16 },
    Terrain { id: u16, terrain: u16 },
    Flag { id: u16, bit: u8, value: bool },
}

pub fn replay(store: &mut ProvinceStore, commands: &[Command]) {
    for command in commands {
        match *command {
            Command::Add { id, terrain } => {
                let _ = store.add_province(id, terrain);
            }
            Command::Owner { id, owner } => {
                store.set_owner(id, owner);
            }
            Command::Controller { id, controller } => {
                store.set_controller(id, controller);
            }
            Command::Terrain { id, terrain } => {
                store.set_terrain(id, terrain);
            }
            Command::Flag { id, bit, value } => {
                store.set_flag(id, bit, value);
            }
        }
    }
}
