use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use cladeclock::config::ClockOptions;
use cladeclock::ModelDefinition;
use std::path::Path;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check clade constraints against the tree and show branch ownership
    Validate(cmd::validate::ValidateArgs),
    /// Print the rate of every branch
    Rates(cmd::rates::RatesArgs),
    /// Run a synthetic store/propose/restore loop over the model
    Simulate(cmd::simulate::SimulateArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let (model_path, cli_options) = match &cli.command {
        Commands::Validate(args) => (&args.model, &args.options),
        Commands::Rates(args) => (&args.model, &args.options),
        Commands::Simulate(args) => (&args.model, &args.options),
    };
    let sub_matches = match matches.subcommand() {
        Some((_, m)) => m,
        None => fatal("no subcommand given"),
    };

    info!("📂 Loading model: {}", model_path.display());
    let (def, options) = load_model(model_path, cli_options, sub_matches);

    let mut tree = def.parse_tree().unwrap_or_else(|e| fatal(e));
    info!(
        "🌳 Tree: {} taxa, {} nodes",
        tree.leaf_count(),
        tree.node_count()
    );

    let mut model = def.build(&tree, &options).unwrap_or_else(|e| fatal(e));
    info!("⏱️  Clock: {}", model.name());

    let result = match cli.command {
        Commands::Validate(_) => cmd::validate::run(&tree, &model),
        Commands::Rates(_) => cmd::rates::run(&tree, &mut model),
        Commands::Simulate(args) => cmd::simulate::run(args, &mut tree, &mut model),
    };
    if let Err(e) = result {
        fatal(e);
    }
}

fn load_model(
    path: &Path,
    cli_options: &ClockOptions,
    matches: &ArgMatches,
) -> (ModelDefinition, ClockOptions) {
    let def = ModelDefinition::load_from_file(path).unwrap_or_else(|e| fatal(e));
    let mut options = def.options.clone();
    options.merge_from_cli(cli_options, matches);
    (def, options)
}

fn fatal(e: impl std::fmt::Display) -> ! {
    error!("❌ {}", e);
    process::exit(1);
}
