mod common;

use province_core::{
    apply_scenario, ColdDataCache, ProvinceStore, StoreError, MAX_PROVINCE_CAPACITY,
};

#[test]
fn fixture_scenario_skips_duplicate_and_keeps_first() -> anyhow::Result<()> {
    let scenario = common::baltic_scenario();
    let mut store = ProvinceStore::new(16)?;
    let mut cold = ColdDataCache::new();

    let summary = apply_scenario(&mut store, &mut cold, &scenario);

    assert_eq!(summary.registered, 5);
    assert_eq!(summary.skipped, vec![(2, StoreError::DuplicateIdentifier(2))]);
    assert_eq!(store.get_state_or_default(2).terrain_type, 3);
    assert_eq!(store.query_by_owner(1), vec![1, 2]);
    assert_eq!(store.query_by_owner(2), vec![3, 4]);
    assert_eq!(store.query_by_controller(1), vec![1, 2, 4]);
    assert!(store.get_state_or_default(4).is_occupied());
    assert_eq!(cold.get(3).map(|data| data.name.as_str()), Some("Gotland"));
    assert!(store.validate_structural_integrity().is_ok());
    Ok(())
}

#[test]
fn full_id_space_registers_and_validates() -> anyhow::Result<()> {
    let mut store = ProvinceStore::new(MAX_PROVINCE_CAPACITY)?;
    for id in (1..=u16::MAX).rev() {
        store.add_province(id, id % 7)?;
    }
    assert_eq!(store.len(), MAX_PROVINCE_CAPACITY);
    assert_eq!(store.slot_of(u16::MAX), Some(0));
    assert_eq!(store.id_at(MAX_PROVINCE_CAPACITY - 1), Some(1));
    assert!(matches!(
        store.add_province(1, 0),
        Err(StoreError::CapacityExceeded { .. })
    ));
    assert!(store.validate_structural_integrity().is_ok());
    Ok(())
}

#[test]
fn cold_cache_is_independent_of_store_lifecycle() {
    let mut store = ProvinceStore::new(8).expect("store");
    let mut cold = ColdDataCache::new();
    store.add_province(5, 1).expect("register");
    cold.get_or_create(5).record(12, 3, "ceded");
    // Cold entries may exist for ids the store never saw.
    cold.get_or_create(77).buildings.push(4);

    store.clear();
    assert_eq!(cold.len(), 2);
    assert_eq!(cold.get_or_create(5).history.len(), 1);

    cold.clear();
    assert!(cold.is_empty());
}
