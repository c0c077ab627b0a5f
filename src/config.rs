use crate::clade::MonophylyPolicy;
use clap::parser::ValueSource;
use clap::{ArgMatches, Args};
use serde::{Deserialize, Serialize};

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockOptions {
    /// Rescale rates so their branch-length-weighted mean is 1
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// Number of rate categories (<= 0 picks the default for the clock)
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub discrete_rates: i64,

    /// How relaxed clocks treat clades that are not monophyletic
    #[arg(long, default_value_t = MonophylyPolicy::Warn)]
    pub monophyly: MonophylyPolicy,
}

impl Default for ClockOptions {
    fn default() -> Self {
        Self {
            normalize: false,
            discrete_rates: -1,
            monophyly: MonophylyPolicy::Warn,
        }
    }
}

impl ClockOptions {
    /// Take values the user typed on the command line; keep the rest.
    pub fn merge_from_cli(&mut self, cli_options: &ClockOptions, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli_options.$field.clone();
                }
            };
        }

        update_if_present!(normalize, "normalize");
        update_if_present!(discrete_rates, "discrete_rates");
        update_if_present!(monophyly, "monophyly");
    }
}

#[derive(Args, Debug, Clone)]
pub struct SamplerParams {
    #[arg(long, default_value_t = 1_000)]
    pub steps: usize,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
    /// Write a trace line every N steps
    #[arg(long, default_value_t = 100)]
    pub log_every: usize,
    /// Chance that a proposal is accepted
    #[arg(long, default_value_t = 0.5)]
    pub accept_prob: f64,
    /// Half-width of the multiplicative window for rate proposals
    #[arg(long, default_value_t = 0.2)]
    pub rate_window: f64,
    /// Half-width of the additive window for branch length proposals
    #[arg(long, default_value_t = 0.1)]
    pub length_window: f64,
}
