mod common;

use cladeclock::clade::CladeConstraint;
use cladeclock::{BranchRateModel, ModelDefinition};
use common::*;

fn bits(rates: &[f64]) -> Vec<u64> {
    rates.iter().map(|r| r.to_bits()).collect()
}

#[test]
fn test_restore_after_forced_rebuild_is_bit_exact() {
    let tree = tree(FIVE_TAXA);
    let mut clock = log_normal(&tree, vec![CladeConstraint::new("abc", &["A", "B", "C"])], 0.4, true);
    clock.requires_recalculation();
    let before = all_rates(&mut clock, &tree);
    let table = clock.table().rates().to_vec();
    let scale = clock.scale_factor();

    clock.store();
    clock.stddev_mut().unwrap().set_value(0, 1.3).unwrap();
    assert!(clock.requires_recalculation());
    let proposed = all_rates(&mut clock, &tree);
    assert_ne!(bits(&proposed), bits(&before));
    assert_ne!(clock.table().rates(), table.as_slice());

    clock.restore();
    assert_eq!(bits(&all_rates(&mut clock, &tree)), bits(&before));
    assert_eq!(clock.table().rates(), table.as_slice());
    assert_eq!(clock.scale_factor().to_bits(), scale.to_bits());
    assert_eq!(clock.stddev_mut().unwrap().value(0).unwrap(), 0.4);
}

#[test]
fn test_restore_rolls_back_categories_and_mean_rates() {
    let tree = tree(FIVE_TAXA);
    let mut clock = relaxed(&tree, vec![CladeConstraint::new("de", &["D", "E"])], true);
    clock.requires_recalculation();
    let before = all_rates(&mut clock, &tree);

    clock.store();
    clock.categories_mut().set_value(3, 0).unwrap();
    clock.mean_rates_mut().set_value(0, 4.0).unwrap();
    clock.requires_recalculation();
    all_rates(&mut clock, &tree);

    clock.restore();
    assert!(!clock.requires_recalculation());
    assert_eq!(bits(&all_rates(&mut clock, &tree)), bits(&before));
}

#[test]
fn test_accept_keeps_new_state() {
    let tree = tree(FIVE_TAXA);
    let mut clock = log_normal(&tree, vec![], 0.4, false);
    clock.store();
    clock.stddev_mut().unwrap().set_value(0, 0.8).unwrap();
    clock.requires_recalculation();
    let accepted = all_rates(&mut clock, &tree);

    // next cycle stores the accepted state; a rejected move returns to it
    clock.store();
    clock.categories_mut().set_value(0, 5).unwrap();
    clock.requires_recalculation();
    all_rates(&mut clock, &tree);
    clock.restore();
    assert_eq!(bits(&all_rates(&mut clock, &tree)), bits(&accepted));
}

#[test]
fn test_many_rejections_in_a_row() {
    let tree = tree(FOUR_TAXA);
    let mut clock = log_normal(&tree, vec![CladeConstraint::new("ab", &["A", "B"])], 0.3, true);
    clock.requires_recalculation();
    let before = all_rates(&mut clock, &tree);

    for step in 0..20 {
        clock.store();
        let sd = 0.1 + step as f64 * 0.05;
        clock.stddev_mut().unwrap().set_value(0, sd).unwrap();
        clock.requires_recalculation();
        all_rates(&mut clock, &tree);
        clock.restore();
        assert_eq!(bits(&all_rates(&mut clock, &tree)), bits(&before), "step {}", step);
    }
}

#[test]
fn test_strict_model_round_trip() {
    let json = r#"{
        "tree": "(((A:1,B:1):1,C:2):1,(D:1,E:1.5):2);",
        "clades": [{"id": "ab", "taxa": ["A", "B"]}, {"id": "de", "taxa": ["D", "E"]}],
        "clock": {"type": "strict", "clock_rates": [2.0, 0.5], "base_rate": 1.5}
    }"#;
    let def = ModelDefinition::try_from(json).unwrap();
    let tree = def.parse_tree().unwrap();
    let mut model = def.build(&tree, &def.options).unwrap();
    let before = all_rates(&mut model, &tree);
    assert_eq!(before, vec![2.0, 2.0, 1.5, 0.5, 0.5, 1.5, 1.5, 1.5, 1.0]);

    model.store();
    if let cladeclock::ClockModel::Strict(clock) = &mut model {
        clock.base_rate_mut().set_value(0, 9.0).unwrap();
    }
    assert!(model.requires_recalculation());
    assert_eq!(model.rate_for_branch(&tree, 2).unwrap(), 9.0);
    model.restore();
    assert_eq!(all_rates(&mut model, &tree), before);
}
