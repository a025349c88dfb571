//! This is the main entry point for the `pysrpm` binary.

use clap::Parser;
use indicatif::MultiProgress;
use tracing_subscriber::{fmt, prelude::*};

use pysrpm::{
    console_utils::{IndicatifWriter, TracingFormatter, get_default_env_filter},
    opt::App,
    run,
};

fn main() -> miette::Result<()> {
    let args = App::parse();

    let multi_progress = MultiProgress::new();

    // Setup tracing subscriber
    tracing_subscriber::registry()
        .with(get_default_env_filter(args.verbose.filter()))
        .with(
            fmt::layer()
                .with_writer(IndicatifWriter::new(multi_progress.clone()))
                .event_format(TracingFormatter),
        )
        .init();

    run(args, multi_progress)
}
