use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::error;

use rivu_bridge::ui::cli::Cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn run(cli: Cli) -> Result<()> {
    use anyhow::{Context, bail};
    use log::{debug, info};
    use rivu_bridge::core::attributes::Attribute;
    use rivu_bridge::core::dataset::TrainingDataset;
    use rivu_bridge::dispatcher::Dispatcher;
    use rivu_bridge::session::Session;
    use rivu_bridge::streams::ArffFileStream;
    use rivu_bridge::transport::shm::ShmTransport;

    let learner = cli.learner_choice()?;

    let mut stream = ArffFileStream::open(&cli.data, None)
        .with_context(|| format!("failed to open {}", cli.data.display()))?;
    let header = stream.header();
    let schema = header.schema();
    if schema.class_count == 0 {
        bail!(
            "class attribute of {} must be nominal",
            cli.data.display()
        );
    }
    for attribute in &header.attributes {
        debug!("{}", attribute.arff_representation());
    }
    let seed = stream
        .read_all()
        .with_context(|| format!("failed to read {}", cli.data.display()))?;
    info!(
        "Read {} seed instances from {} ({schema})",
        seed.len(),
        cli.data.display()
    );

    let session = Session::with_dataset(
        header,
        learner.build(),
        TrainingDataset::from_instances(seed),
    );
    let transport = ShmTransport::open(&cli.segment, schema, cli.max_rows as usize)
        .with_context(|| format!("failed to open segment {}", cli.segment.display()))?;

    Dispatcher::new(session, transport, io::stdout())
        .run()
        .context("session aborted")
}

#[cfg(not(unix))]
fn run(_cli: Cli) -> Result<()> {
    anyhow::bail!("the shared-memory transport needs a unix platform")
}
