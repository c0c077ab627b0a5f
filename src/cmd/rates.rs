use crate::reports::{self, RateRow};
use clap::Args;
use cladeclock::config::ClockOptions;
use cladeclock::{BranchRateModel, ClockModel, ClockResult, Tree};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct RatesArgs {
    #[arg(short, long)]
    pub model: PathBuf,

    #[command(flatten)]
    pub options: ClockOptions,
}

pub fn run(tree: &Tree, model: &mut ClockModel) -> ClockResult<()> {
    let mut rows = Vec::with_capacity(tree.node_count());
    for node in 0..tree.node_count() {
        let rate = model.rate_for_branch(tree, node)?;
        let owner = if tree.is_root(node) {
            None
        } else {
            let clade = model.ownership().and_then(|o| o.owner(node));
            Some(match clade {
                Some(i) => model.clades()[i].id.clone(),
                None => "background".to_string(),
            })
        };
        rows.push(RateRow {
            node,
            taxon: tree.taxon(node).map(str::to_string),
            owner,
            category: model.category_of(tree, node)?,
            length: tree.branch_length(node),
            rate,
        });
    }

    println!("\n📈 === BRANCH RATES: {} === 📈", model.name());
    reports::print_rate_report(&rows);
    Ok(())
}
