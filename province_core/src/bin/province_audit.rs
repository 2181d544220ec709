use std::path::PathBuf;
use std::process::ExitCode;

use bevy_ecs::schedule::IntoSystemConfigs;
use serde::Serialize;
use tracing::{error, info, warn};

use province_core::metrics::collect_store_metrics;
use province_core::{
    apply_scenario, build_province_world, build_sync_schedule, load_store_config_from_env,
    run_sync, ColdDataCache, ProvinceStore, ScenarioDefinition, StateChecksum,
    StoreConfigMetadata, StoreMetrics, SyncState,
};

#[derive(Debug, Serialize)]
struct AuditReport {
    config: Option<PathBuf>,
    scenario: Option<PathBuf>,
    registered: usize,
    skipped: usize,
    violations: Vec<String>,
    checksum: Option<StateChecksum>,
    metrics: StoreMetrics,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (config, metadata) = load_store_config_from_env();
    let mut world = match build_province_world(config.clone()) {
        Ok(world) => world,
        Err(err) => {
            error!(
                target: "province_core::audit",
                error = %err,
                config = ?metadata.path(),
                "province store could not be constructed"
            );
            return ExitCode::FAILURE;
        }
    };
    world.insert_resource(metadata);
    world.insert_resource(StoreMetrics::default());

    let scenario_path = std::env::args_os().nth(1).map(PathBuf::from);
    let mut registered = 0;
    let mut skipped = 0;
    if let Some(path) = &scenario_path {
        let scenario = match ScenarioDefinition::from_file(path) {
            Ok(scenario) => scenario,
            Err(err) => {
                error!(target: "province_core::audit", error = %err, "scenario.load_failed");
                return ExitCode::FAILURE;
            }
        };
        world.resource_scope(|world, mut store: bevy_ecs::world::Mut<ProvinceStore>| {
            let mut cold = world.resource_mut::<ColdDataCache>();
            let summary = apply_scenario(&mut store, &mut cold, &scenario);
            registered = summary.registered;
            skipped = summary.skipped.len();
        });
    }

    let violations: Vec<String> = if config.validate_after_load {
        match world.resource::<ProvinceStore>().validate_structural_integrity() {
            Ok(()) => Vec::new(),
            Err(found) => {
                for violation in &found {
                    warn!(target: "province_core::audit", %violation, "integrity.violation");
                }
                found.iter().map(ToString::to_string).collect()
            }
        }
    } else {
        Vec::new()
    };

    let mut schedule = build_sync_schedule();
    schedule.add_systems(collect_store_metrics.after(province_core::sync::capture_checksum));
    run_sync(&mut world, &mut schedule);

    let report = AuditReport {
        config: world.resource::<StoreConfigMetadata>().path().cloned(),
        scenario: scenario_path,
        registered,
        skipped,
        violations,
        checksum: world.resource::<SyncState>().latest().copied(),
        metrics: world.resource::<StoreMetrics>().clone(),
    };

    info!(
        target: "province_core::audit",
        registered = report.registered,
        skipped = report.skipped,
        "Province audit complete"
    );
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            error!(target: "province_core::audit", error = %err, "report.encode_failed");
            return ExitCode::FAILURE;
        }
    }

    if report.violations.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
