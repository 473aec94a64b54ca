//! Runs both backends against the same generated workload and prints a
//! waste-or-savings report for each.
//!
//! No argument parsing: the run is driven entirely by [`Config::default`].

use anyhow::Context;
use kv_paging_sim::{
    backend::{mono::MonolithicBackend, paged::PagedBackend},
    Config, Report, SimulationDriver, WorkloadGenerator,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::default();
    config.validate().context("default config is invalid")?;

    info!(bytes_per_token = config.bytes_per_token(), "resolved config");

    let work = WorkloadGenerator::generate(&config);

    let mono = MonolithicBackend::create(config).context("failed to create monolithic backend")?;
    let mono_stats = SimulationDriver::run(&mono, &config, &work);
    println!("{}", Report::new("Monolithic (fixed context window)", mono_stats));

    let paged = PagedBackend::create(config).context("failed to create paged backend")?;
    let paged_stats = SimulationDriver::run(&paged, &config, &work);
    println!("{}", Report::new("Paged+Prefix (shared, copy-on-write)", paged_stats));

    Ok(())
}
