use anyhow::{Context, bail};
use tracing_subscriber::{EnvFilter, fmt};

use domain_etf::core::UserId;
use domain_etf::{BundleService, BuyRequest, Config};

const USAGE: &str = "usage: domain-etf [quote | buy <bundle-id> <buyer> <shares> [payment-token] | holdings <user>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logger
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,domain_etf=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    tracing::info!("🦀 Domain ETF starting...");

    // 2. Config, service and catalog
    let config = Config::load_default().with_env_overrides();
    let service = BundleService::from_config(&config)?;
    for new in config.bundles.iter().cloned() {
        let name = new.name.clone();
        match service.create_bundle(new).await {
            Ok(quote) => tracing::info!("📦 Loaded bundle {} ({})", quote.bundle.id, quote.bundle.symbol),
            Err(e) => tracing::warn!("⚠️ Skipping bundle {}: {}", name, e),
        }
    }

    // 3. Command
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = match args.as_slice() {
        [] | ["quote"] => serde_json::to_string_pretty(&service.list_bundles().await?)?,
        ["buy", bundle_id, buyer, shares, rest @ ..] if rest.len() <= 1 => {
            let request = BuyRequest {
                bundle_id: bundle_id.parse().context("bundle id must be an integer")?,
                buyer: buyer.to_string(),
                shares: shares.parse().context("shares must be an integer")?,
                payment_token: rest.first().map(|t| t.to_string()),
            };
            let receipt = service.buy(&request).await?;
            if receipt.needs_resubmission() {
                tracing::warn!("Trade {} committed, order not yet on the orderbook", receipt.transaction_id);
            }
            serde_json::to_string_pretty(&receipt)?
        }
        ["holdings", user] => serde_json::to_string_pretty(&service.holdings(&UserId::new(*user)).await?)?,
        _ => bail!(USAGE),
    };

    println!("{}", output);
    Ok(())
}
