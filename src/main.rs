mod analysis;
mod args;

use clap::Parser;
use log::{debug, LevelFilter};
use snafu::ErrorCompat;

use crate::analysis::*;
use crate::args::{Args, Command};

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    debug!("args: {:?}", args);

    let res = match args.command {
        Command::Template { criteria, out } => run_template(&criteria, out.as_deref()),
        Command::Evaluate {
            criteria,
            comparisons,
            user,
            out,
        } => run_evaluate(&criteria, &comparisons, &user, out.as_deref()),
        Command::Consensus {
            criteria,
            evaluations,
            select,
        } => run_consensus(&criteria, &evaluations, &select),
        Command::Rank {
            config,
            out,
            reference,
        } => run_analysis(&config, out.as_deref(), reference.as_deref()),
    };

    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(s) = source {
            eprintln!("  caused by: {}", s);
            source = s.source();
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
