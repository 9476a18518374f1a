use chrono::NaiveDate;
use std::env;

use subtally::infrastructure::rates::{
    ExchangeRateProvider, HistoricalRatesClient, RateLookup,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let currency = args.next().unwrap_or_else(|| "EUR".to_string());
    let base = args.next().unwrap_or_else(|| "USD".to_string());
    let date = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
        None => NaiveDate::from_ymd_opt(2019, 1, 4).ok_or("invalid default date")?,
    };

    println!("Checking exchange-rate API for {} -> {} on {}...", currency, base, date);

    let client = HistoricalRatesClient::new("https://api.exchangeratesapi.io", base.clone());
    match client.lookup(date, &currency).await {
        Ok(RateLookup::Available(rate)) => {
            println!("Rate found: 1 {} = {} {}", currency, rate, base);
        }
        Ok(RateLookup::NotAvailable) => {
            println!("No rate published for {} on {} (weekend or unknown currency)", currency, date);
            println!("The normalizer would fall back to the nearest prior business day.");
        }
        Err(e) => {
            println!("API request failed: {}", e);
        }
    }

    Ok(())
}
