use clap::{Parser, Subcommand};

/// Ranks drivers with AHP weights elicited from evaluators and the TOPSIS method.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Writes the comparison sheet of a criteria catalog: one all-ones matrix per node to
    /// compare.
    Template {
        /// (file path) The criteria catalog, in JSON format.
        #[clap(short, long, value_parser)]
        criteria: String,
        /// (file path, 'stdout' or empty) Where to write the comparison sheet.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
    /// Computes the weights of one evaluator from a filled comparison sheet.
    Evaluate {
        /// (file path) The criteria catalog, in JSON format.
        #[clap(short, long, value_parser)]
        criteria: String,
        /// (file path) The filled comparison sheet (see the template command).
        #[clap(long, value_parser)]
        comparisons: String,
        /// The name of the evaluator.
        #[clap(short, long, value_parser)]
        user: String,
        /// (file path, 'stdout' or empty) Where to write the evaluation. An existing evaluation
        /// of the same evaluator at this location is updated and keeps its id.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
    /// Prints the consensus weights of several evaluations.
    Consensus {
        /// (file path) The criteria catalog, in JSON format.
        #[clap(short, long, value_parser)]
        criteria: String,
        /// (file paths) The evaluations to average.
        #[clap(value_parser, required = true)]
        evaluations: Vec<String>,
        /// (evaluation ids, optional) Only average these evaluations.
        #[clap(long, value_parser)]
        select: Vec<String>,
    },
    /// Runs a full analysis: consensus weights, driver data and ranking.
    Rank {
        /// (file path) The run configuration, in JSON format. Relative paths in the
        /// configuration are resolved from its directory.
        #[clap(short, long, value_parser)]
        config: String,
        /// (file path, 'stdout' or empty) If specified, the ranking will be written to the given
        /// location. Setting this option overrides the output file of the configuration.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference summary in JSON format. If provided, drvrank will check that
        /// the computed summary matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
}
