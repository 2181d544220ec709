mod common;

use std::collections::BTreeSet;

use common::Command;
use province_core::{
    apply_scenario, compare, compute_checksum, ChecksumFields, ColdDataCache, ProvinceState,
    ProvinceStore,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_commands(seed: u64, len: usize) -> Vec<Command> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut commands: Vec<Command> = (1..=400u16)
        .map(|id| Command::Add {
            id: id * 3,
            terrain: rng.gen_range(0..12),
        })
        .collect();
    for _ in 0..len {
        let id = rng.gen_range(1..=1_200u16);
        let command = match rng.gen_range(0..4) {
            0 => Command::Owner {
                id,
                owner: rng.gen_range(1..64),
            },
            1 => Command::Controller {
                id,
                controller: rng.gen_range(1..64),
            },
            2 => Command::Terrain {
                id,
                terrain: rng.gen_range(0..12),
            },
            _ => Command::Flag {
                id,
                bit: rng.gen_range(0..16),
                value: rng.gen_bool(0.5),
            },
        };
        commands.push(command);
    }
    commands
}

#[test]
fn example_scenario_matches_across_stores() {
    let build = || {
        let mut store = ProvinceStore::new(10_000).expect("store");
        store.add_province(1000, 4).expect("register 1000");
        store.set_owner(1000, 7);
        store
    };

    let mut store = build();
    assert_eq!(
        store.get_state_or_default(1000),
        ProvinceState {
            owner_id: 7,
            controller_id: 7,
            terrain_type: 4,
            extension_slot: 0,
        }
    );
    let slot = store.slot_of(1000).expect("registered");
    assert_eq!(store.drain_dirty(), vec![slot]);
    store.clear_dirty();
    assert!(store.drain_dirty().is_empty());

    let a = compute_checksum(&store);
    let b = compute_checksum(&build());
    assert_eq!(a.main_hash, b.main_hash);
    assert_eq!(a.ownership_hash, b.ownership_hash);
    assert_eq!(a.terrain_hash, b.terrain_hash);
    assert_eq!(a.entity_count, b.entity_count);
    // Pinned so that a change in folding order or byte order fails loudly.
    assert_eq!(a.main_hash, 0x6b1d_18e1);
}

#[test]
fn replayed_command_logs_agree() {
    for seed in [1u64, 42, 0xdead_beef] {
        let commands = random_commands(seed, 5_000);
        let mut a = ProvinceStore::new(10_000).expect("store a");
        let mut b = ProvinceStore::new(10_000).expect("store b");
        common::replay(&mut a, &commands);
        common::replay(&mut b, &commands);

        let comparison = compare(&compute_checksum(&a), &compute_checksum(&b));
        assert!(comparison.equal, "seed {seed}: {comparison:?}");
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
    }
}

#[test]
fn diverging_command_is_located() {
    let commands = random_commands(9, 2_000);
    let mut a = ProvinceStore::new(10_000).expect("store a");
    let mut b = ProvinceStore::new(10_000).expect("store b");
    common::replay(&mut a, &commands);
    common::replay(&mut b, &commands);

    // Province 3 is always registered by the command log.
    let current = b.get_state_or_default(3);
    b.set_owner(3, current.owner_id.wrapping_add(1).max(1));

    let comparison = compare(&compute_checksum(&a), &compute_checksum(&b));
    assert!(!comparison.equal);
    assert!(comparison.differing.contains(ChecksumFields::OWNERSHIP));
    assert!(!comparison.differing.contains(ChecksumFields::TERRAIN));
    assert!(comparison.is_command_divergence());
}

#[test]
fn dirty_set_matches_touched_slots() {
    let commands = random_commands(77, 3_000);
    let mut store = ProvinceStore::new(10_000).expect("store");
    let (adds, mutations) = commands.split_at(400);
    common::replay(&mut store, adds);
    store.clear_dirty();
    common::replay(&mut store, mutations);

    let expected: BTreeSet<u32> = mutations
        .iter()
        .filter_map(|command| match *command {
            Command::Owner { id, .. }
            | Command::Controller { id, .. }
            | Command::Terrain { id, .. }
            | Command::Flag { id, .. } => store.slot_of(id),
            Command::Add { .. } => None,
        })
        .collect();

    let drained = store.drain_dirty();
    assert_eq!(drained.iter().copied().collect::<BTreeSet<_>>(), expected);
    assert_eq!(drained.len(), expected.len());
}

#[test]
fn scenario_load_checksum_is_pinned() {
    let scenario = common::baltic_scenario();
    let mut store = ProvinceStore::new(64).expect("store");
    let mut cold = ColdDataCache::new();
    let summary = apply_scenario(&mut store, &mut cold, &scenario);
    assert_eq!(summary.registered, 5);

    let checksum = compute_checksum(&store);
    assert_eq!(checksum.entity_count, 5);
    assert_eq!(checksum.main_hash, 0x4a17_adf2);
    assert_eq!(checksum.ownership_hash, 0xe468_e39f);
    assert_eq!(checksum.terrain_hash, 0xa15a_de58);
}
