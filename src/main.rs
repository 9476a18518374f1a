use anyhow::Result;
use clap::Parser;

use subtally::app::{self, AppCfg};
use subtally::config::Config;

#[derive(Parser, Debug)]
#[command(version, about = "Subscription analytics CLI for PayPal Monthly Sales Reports")]
struct Args {
    /// Folder containing the MSR CSV exports
    #[arg(long)]
    folder: Option<String>,

    /// File name pattern of the exports
    #[arg(long, default_value = "MSR-*.CSV")]
    pattern: String,

    /// Reporting currency, e.g. USD (default: first currency seen)
    #[arg(long)]
    base_currency: Option<String>,

    /// Months of billing gap tolerated before a subscription counts as churned
    #[arg(long, default_value_t = 1)]
    gap_tolerance: u32,

    /// Days to walk back when a date has no exchange rate
    #[arg(long, default_value_t = 7)]
    lookback_days: u32,

    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,

    /// Print the full report as JSON instead of the console table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    // Load base configuration from file if provided
    let base_config = if let Some(config_path) = &args.config {
        Some(Config::from_file(config_path)?)
    } else {
        None
    };

    // CLI args > config file > defaults
    let app_cfg = if let Some(cfg) = base_config {
        let mut app_cfg = AppCfg::from_config(cfg, args.json);

        if let Some(folder) = args.folder {
            app_cfg.folder = folder;
        }
        if args.pattern != "MSR-*.CSV" {
            app_cfg.filename_pattern = args.pattern;
        }
        if let Some(base_currency) = args.base_currency {
            app_cfg.base_currency = Some(base_currency);
        }
        if args.gap_tolerance != 1 {
            app_cfg.gap_tolerance_months = args.gap_tolerance;
        }
        if args.lookback_days != 7 {
            app_cfg.max_lookback_days = args.lookback_days;
        }

        app_cfg
    } else {
        let folder = args
            .folder
            .ok_or_else(|| anyhow::anyhow!("--folder is required when not using --config"))?;

        AppCfg {
            folder,
            filename_pattern: args.pattern,
            base_currency: args.base_currency,
            gap_tolerance_months: args.gap_tolerance,
            max_lookback_days: args.lookback_days,
            rates_api_url: "https://api.exchangeratesapi.io".to_string(),
            rates_timeout_ms: 30000,
            columns: Default::default(),
            json: args.json,
        }
    };

    app::run(app_cfg).await
}
