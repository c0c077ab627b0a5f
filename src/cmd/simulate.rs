use crate::reports;
use clap::Args;
use cladeclock::config::{ClockOptions, SamplerParams};
use cladeclock::sampler::SyntheticSampler;
use cladeclock::{ClockModel, ClockResult, Tree};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(short, long)]
    pub model: PathBuf,

    #[command(flatten)]
    pub options: ClockOptions,

    #[command(flatten)]
    pub sampler: SamplerParams,

    /// Write the mean-rate trace (tab-separated) to this file
    #[arg(long)]
    pub log: Option<PathBuf>,
}

pub fn run(args: SimulateArgs, tree: &mut Tree, model: &mut ClockModel) -> ClockResult<()> {
    let mut trace = match &args.log {
        Some(path) => {
            info!("📝 Writing trace to {}", path.display());
            Some(BufWriter::new(File::create(path)?))
        }
        None => None,
    };

    println!(
        "🎲 Sampling {} steps (seed {}, accept {:.2})",
        args.sampler.steps, args.sampler.seed, args.sampler.accept_prob
    );
    let start = Instant::now();
    let mut sampler = SyntheticSampler::new(args.sampler.clone());
    let stats = sampler.run(
        model,
        tree,
        trace.as_mut().map(|w| w as &mut dyn Write),
    )?;

    if let Some(mut w) = trace {
        w.flush()?;
    }

    reports::print_sampler_report(&stats, start.elapsed());
    Ok(())
}
