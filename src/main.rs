use std::io::{self, BufReader};

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use statsfold::cliopt::CliOpt;
use statsfold::config::Config;
use statsfold::input::{JsonDecoder, LineReader};
use statsfold::output::{writer::LineWriter, Output};
use statsfold::runner::{self, Runner};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = CliOpt::from_args();

    let filter = match opt.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    let config = match &opt.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let output = Output::new(
        Box::new(LineWriter::new(io::stdout())),
        runner::encoder(opt.encode.as_deref(), &config)?,
    );

    let mut reader = LineReader::new(BufReader::new(io::stdin()));
    let mut runner = Runner::new(&opt, &config, &mut reader, &JsonDecoder::new(), output)?;
    runner.run()?;

    Ok(())
}
