mod common;

use cladeclock::clade::{partition, scan_clade, CladeConstraint, MonophylyPolicy};
use cladeclock::taxa::TaxonSet;
use cladeclock::ClockError;
use common::*;
use rstest::rstest;

fn owners(newick: &str, clades: &[CladeConstraint]) -> Vec<Option<usize>> {
    let tree = tree(newick);
    let taxa = TaxonSet::from_tree(&tree);
    let part = partition(&tree, &taxa, clades, MonophylyPolicy::Warn).unwrap();
    (0..tree.node_count()).map(|n| part.ownership.owner(n)).collect()
}

#[test]
fn test_four_taxon_scenario() {
    // {A,B}: the leaves belong to the clade, their parent is the MRCA
    let got = owners(FOUR_TAXA, &[CladeConstraint::new("ab", &["A", "B"])]);
    assert_eq!(got, vec![Some(0), Some(0), None, None, None, None, None]);
}

#[rstest]
#[case(&["A", "B"], &[0, 1], 5)]
#[case(&["A", "B", "C"], &[0, 1, 5, 2], 6)]
#[case(&["D", "E"], &[3, 4], 7)]
#[case(&["C"], &[2], 2)]
#[case(&["A", "B", "C", "D", "E"], &[0, 1, 5, 2, 6, 3, 4, 7], 8)]
fn test_scan_nodes_and_mrca(
    #[case] taxa: &[&str],
    #[case] expected: &[usize],
    #[case] mrca: usize,
) {
    let tree = tree(FIVE_TAXA);
    let set = TaxonSet::from_tree(&tree);
    let membership = set.membership(&CladeConstraint::new("c", taxa)).unwrap();
    let scan = scan_clade(&tree, &membership);
    assert_eq!(scan.nodes, expected);
    assert_eq!(scan.mrca, Some(mrca));
    assert!(scan.monophyletic);
    assert!(!scan.nodes.contains(&tree.root()));
}

#[test]
fn test_nested_clade_wins_regardless_of_declaration_order() {
    let outer = CladeConstraint::new("abc", &["A", "B", "C"]);
    let inner = CladeConstraint::new("ab", &["A", "B"]);

    let a = owners(FIVE_TAXA, &[outer.clone(), inner.clone()]);
    assert_eq!(a[0], Some(1));
    assert_eq!(a[1], Some(1));
    assert_eq!(a[5], Some(0));
    assert_eq!(a[2], Some(0));

    let b = owners(FIVE_TAXA, &[inner, outer]);
    assert_eq!(b[0], Some(0));
    assert_eq!(b[1], Some(0));
    assert_eq!(b[5], Some(1));
    assert_eq!(b[2], Some(1));
}

#[test]
fn test_mrca_branch_goes_to_enclosing_scope() {
    let got = owners(
        FIVE_TAXA,
        &[
            CladeConstraint::new("abc", &["A", "B", "C"]),
            CladeConstraint::new("ab", &["A", "B"]),
        ],
    );
    // MRCA of {A,B} is node 5, owned by the enclosing clade
    assert_eq!(got[5], Some(0));
    // MRCA of {A,B,C} is node 6, background
    assert_eq!(got[6], None);
}

#[test]
fn test_sibling_clades_partition_disjointly() {
    let got = owners(
        FIVE_TAXA,
        &[
            CladeConstraint::new("abc", &["A", "B", "C"]),
            CladeConstraint::new("de", &["D", "E"]),
        ],
    );
    assert_eq!(
        got,
        vec![Some(0), Some(0), Some(0), Some(1), Some(1), Some(0), None, None, None]
    );
}

#[test]
fn test_all_taxa_clade_owns_every_branch() {
    let got = owners(FIVE_TAXA, &[CladeConstraint::all_taxa("everything")]);
    assert!(got[..8].iter().all(|o| *o == Some(0)));
    assert_eq!(got[8], None);
}

#[rstest]
#[case(CladeConstraint::new("bad", &["A", "Zebra"]))]
#[case(CladeConstraint::new("dup", &["A", "B", "B"]))]
fn test_taxon_errors_abort_partition(#[case] clade: CladeConstraint) {
    let tree = tree(FIVE_TAXA);
    let taxa = TaxonSet::from_tree(&tree);
    let res = partition(&tree, &taxa, &[clade], MonophylyPolicy::Warn);
    assert!(matches!(
        res,
        Err(ClockError::UnknownTaxon { .. }) | Err(ClockError::DuplicateTaxon { .. })
    ));
}

#[test]
fn test_error_message_names_clade_and_taxon() {
    let tree = tree(FIVE_TAXA);
    let taxa = TaxonSet::from_tree(&tree);
    let err = partition(
        &tree,
        &taxa,
        &[CladeConstraint::new("primates.prior", &["A", "Zebra"])],
        MonophylyPolicy::Require,
    )
    .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("primates.prior"));
    assert!(msg.contains("Zebra"));
}

#[test]
fn test_deep_caterpillar_partitions() {
    // ((((T0,T1),T2),T3)...): leaves 0..n, (T0,T1) = n, each later join one id higher
    let leaves = 20_000;
    let mut newick = "(".repeat(leaves - 1);
    newick.push_str("T0:1");
    for i in 1..leaves {
        newick.push_str(&format!(",T{}:1)", i));
        if i < leaves - 1 {
            newick.push_str(":1");
        }
    }
    newick.push(';');

    let got = owners(&newick, &[CladeConstraint::new("base", &["T0", "T1", "T2"])]);
    let owned: Vec<usize> = (0..got.len()).filter(|&n| got[n] == Some(0)).collect();
    // three leaves plus the (T0,T1) join; ((T0,T1),T2) is the MRCA
    assert_eq!(owned, vec![0, 1, 2, leaves]);
    assert_eq!(got[leaves + 1], None);
}
