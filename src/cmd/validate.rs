use crate::reports;
use clap::Args;
use cladeclock::clade::{partition, MonophylyPolicy};
use cladeclock::config::ClockOptions;
use cladeclock::taxa::TaxonSet;
use cladeclock::{ClockModel, ClockResult, Tree};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(short, long)]
    pub model: PathBuf,

    #[command(flatten)]
    pub options: ClockOptions,
}

pub fn run(tree: &Tree, model: &ClockModel) -> ClockResult<()> {
    // The model already enforced its policy; re-scan leniently for the report.
    let taxa = TaxonSet::from_tree(tree);
    let part = partition(tree, &taxa, model.clades(), MonophylyPolicy::Warn)?;

    println!("\n🔎 === CLADE AUDIT === 🔎");
    if model.clades().is_empty() {
        println!("No clades declared; every branch takes the background rate.");
        return Ok(());
    }
    reports::print_clade_report(tree, model.clades(), &part);
    Ok(())
}
