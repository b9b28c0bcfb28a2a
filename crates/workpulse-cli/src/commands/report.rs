use chrono::{NaiveDate, Utc};
use clap::Args;
use workpulse_core::{Config, RunReport};

#[derive(Args)]
pub struct ReportArgs {
    /// Day to show (YYYY-MM-DD); defaults to today in the configured offset
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let date = args
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&config.sweep.offset()).date_naive());
    let report = RunReport::load(&config.report_dir()?, date)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
