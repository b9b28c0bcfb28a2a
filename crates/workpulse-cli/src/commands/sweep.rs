use clap::Args;
use workpulse_core::{Config, HttpPushGateway, SqliteStore, SweepEngine};

#[derive(Args)]
pub struct SweepArgs {
    /// Send the administrator a per-pass resume summary
    #[arg(long)]
    pub summary: bool,
    /// Print the run report as JSON instead of the one-line banner
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open(&config.db_path()?)?;
    let gateway = HttpPushGateway::new(&config.push)?;
    let report_dir = config.report_dir()?;
    let engine = SweepEngine::new(store, gateway, config.sweep, report_dir);

    let report = engine.run(args.summary)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "run {} on {}: {} workers, {} resume, {} early, {} stop, {} errors",
            report.run_id,
            report.date,
            report.workers.len(),
            report.totals.resume_attempts,
            report.totals.early_reminders,
            report.totals.stop_reminders,
            report.totals.worker_errors,
        );
    }
    Ok(())
}
