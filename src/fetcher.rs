use crate::config::UpstreamConfig;
use crate::errors::FetchError;
use crate::models::{MiningPoolShare, PoolDistribution, PriceSnapshot};
use once_cell::sync::Lazy;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

pub const FALLBACK_PRICE: PriceSnapshot = PriceSnapshot {
    usd: 45_000.0,
    usd_market_cap: 850_000_000_000.0,
    usd_24h_change: 2.5,
};

// Shared client; per-call timeouts are set on each request.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    reqwest::ClientBuilder::new()
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(4)
        .connect_timeout(Duration::from_secs(5))
        .tcp_keepalive(Duration::from_secs(30))
        .user_agent("chainrisk-monitor/0.1")
        .build()
        .expect("Failed to create HTTP client")
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolsResponse {
    pools: Vec<PoolEntry>,
    block_count: Option<u64>,
    last_estimated_hashrate: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolEntry {
    name: String,
    link: Option<String>,
    block_count: u64,
    rank: Option<u32>,
}

async fn get_json<T>(request: RequestBuilder, timeout: Duration) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let started = Instant::now();
    let response = request.timeout(timeout).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let body = response.text().await?;
    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        bytes = body.len(),
        "Upstream call completed"
    );
    serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
}

pub async fn fetch_price(config: &UpstreamConfig) -> Result<PriceSnapshot, FetchError> {
    let request = HTTP_CLIENT.get(&config.price_url).query(&[
        ("ids", config.asset_id.as_str()),
        ("vs_currencies", config.currency.as_str()),
        ("include_market_cap", "true"),
        ("include_24hr_change", "true"),
    ]);
    let body: HashMap<String, HashMap<String, Option<f64>>> =
        get_json(request, config.price_timeout()).await?;

    let quote = body
        .get(&config.asset_id)
        .ok_or_else(|| FetchError::Malformed(format!("no quote for {}", config.asset_id)))?;
    let field = |key: String| {
        quote
            .get(&key)
            .copied()
            .flatten()
            .ok_or(FetchError::Malformed(format!("missing {}", key)))
    };

    Ok(PriceSnapshot {
        usd: field(config.currency.clone())?,
        usd_market_cap: field(format!("{}_market_cap", config.currency))?,
        usd_24h_change: field(format!("{}_24h_change", config.currency))?,
    })
}

pub async fn fetch_pools(config: &UpstreamConfig) -> Result<PoolDistribution, FetchError> {
    let request = HTTP_CLIENT.get(&config.pools_url);
    let body: PoolsResponse = get_json(request, config.pools_timeout()).await?;

    if body.pools.is_empty() {
        return Err(FetchError::Malformed("empty pool list".to_string()));
    }

    let pool_sum = body
        .pools
        .iter()
        .try_fold(0u64, |acc, p| acc.checked_add(p.block_count))
        .ok_or_else(|| FetchError::Malformed("pool block counts overflow".to_string()))?;
    let total_blocks = body.block_count.unwrap_or(pool_sum);
    if total_blocks == 0 {
        return Err(FetchError::Malformed("zero total block count".to_string()));
    }
    // Shares must stay within 0..=100.
    if let Some(p) = body.pools.iter().find(|p| p.block_count > total_blocks) {
        return Err(FetchError::Malformed(format!(
            "pool {} has {} blocks, more than the total {}",
            p.name, p.block_count, total_blocks
        )));
    }

    let pools = body
        .pools
        .into_iter()
        .enumerate()
        .map(|(i, p)| MiningPoolShare {
            name: p.name,
            hash_rate_percent: 0.0,
            block_count: p.block_count,
            rank: p.rank.unwrap_or(i as u32 + 1),
            link: p.link.unwrap_or_default(),
        })
        .collect();

    Ok(PoolDistribution {
        pools,
        total_blocks,
        network_hash_rate: body.last_estimated_hashrate,
    })
}

pub fn price_or_fallback(result: Result<PriceSnapshot, FetchError>) -> PriceSnapshot {
    match result {
        Ok(price) => price,
        Err(e) => {
            warn!(err = %e, "Price fetch failed, using fallback price");
            FALLBACK_PRICE
        }
    }
}

pub fn pools_or_fallback(result: Result<PoolDistribution, FetchError>) -> PoolDistribution {
    match result {
        Ok(distribution) => distribution,
        Err(e) => {
            error!(err = %e, "Mining pool fetch failed, using fallback distribution");
            fallback_pools()
        }
    }
}

/// Synthetic distribution with preset shares. `total_blocks` is zero so the
/// aggregator keeps the preset percentages.
pub fn fallback_pools() -> PoolDistribution {
    let preset = [
        ("Foundry USA", 27.5, "https://foundrydigital.com"),
        ("AntPool", 23.3, "https://www.antpool.com"),
        ("ViaBTC", 12.8, "https://www.viabtc.com"),
        ("F2Pool", 11.2, "https://www.f2pool.com"),
        ("Binance Pool", 8.9, "https://pool.binance.com"),
    ];

    let pools = preset
        .iter()
        .enumerate()
        .map(|(i, &(name, percent, link))| MiningPoolShare {
            name: name.to_string(),
            hash_rate_percent: percent,
            block_count: 0,
            rank: i as u32 + 1,
            link: link.to_string(),
        })
        .collect();

    PoolDistribution {
        pools,
        total_blocks: 0,
        network_hash_rate: None,
    }
}

/// Runs both upstream calls one after the other, substituting fallback data
/// for whichever fails.
pub async fn fetch_market_data(config: &UpstreamConfig) -> (PriceSnapshot, PoolDistribution) {
    let price = price_or_fallback(fetch_price(config).await);
    let pools = pools_or_fallback(fetch_pools(config).await);
    (price, pools)
}
