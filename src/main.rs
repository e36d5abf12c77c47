use casedesk::cli::{Cli, Commands};
use casedesk::{Config, init_tracing, run};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    // `init` creates the config file, so it must not require one.
    let config = if matches!(cli.command, Some(Commands::Init)) {
        Config::default()
    } else {
        cli.load_config()?
    };
    init_tracing(&config);

    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(cli, config))
}
