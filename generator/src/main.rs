mod cli;
mod remote;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xcg_generator::{
    emit::{DryRunSink, FileSink},
    Generator, MappedNamespaceProvider,
};
use xcg_xsd::ParseOptions;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let namespaces = cli
        .namespaces
        .iter()
        .fold(MappedNamespaceProvider::new(), |provider, (uri, name)| {
            provider.with(uri, name)
        });
    let generator = Generator::new(cli.config())
        .with_parse_options(ParseOptions {
            allow_dtd: cli.allow_dtd,
        })
        .with_namespace_provider(namespaces);

    let set = generator
        .load(&cli.inputs, &remote::RemoteResolver::new())
        .context("failed to load the schema set")?;

    if cli.dry_run {
        let mut sink = DryRunSink::new();
        generator.generate(&set, &mut sink)?;
        for path in sink.paths() {
            println!("{}", cli.output.join(path).display());
        }
        return Ok(());
    }

    let mut sink = FileSink::new(&cli.output);
    let generated = generator.generate(&set, &mut sink)?;
    for failure in &generated.report.failures {
        tracing::error!("{failure}");
    }
    if !generated.report.failures.is_empty() {
        anyhow::bail!(
            "{} of {} artifacts could not be written",
            generated.report.failures.len(),
            generated.report.failures.len() + generated.report.written.len()
        );
    }
    Ok(())
}
