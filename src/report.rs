use chrono::{DateTime, Local};

use crate::models::{AttackRecord, AttackReport, PoolSummary, PriceSnapshot, RiskSummary};
use crate::risk::format_hash_rate;

const NETWORK_NODES: &str = "~15,000+ reachable nodes";
const BLOCK_HEIGHT: &str = "Live from mempool.space";
const DATA_SOURCE: &str = "CoinGecko API & Mempool.space API";

pub fn build_report(
    price: PriceSnapshot,
    pools: PoolSummary,
    attacks: Vec<AttackRecord>,
    risk: RiskSummary,
    now: DateTime<Local>,
) -> AttackReport {
    // The 51% record always leads the table.
    let attack_51_probability = attacks.first().map(|a| a.probability).unwrap_or_default();

    AttackReport {
        success: true,
        bitcoin_data: price,
        network_hash_rate: format_hash_rate(pools.network_hash_rate.as_ref()),
        attacks,
        mining_pools: pools.pools,
        top_pools_combined: pools.top_pools_combined,
        attack_51_probability,
        total_blocks_24h: pools.total_blocks,
        total_risk_score: risk.total_risk_score,
        risk_level: risk.risk_level,
        timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        network_nodes: NETWORK_NODES.to_string(),
        block_height: BLOCK_HEIGHT.to_string(),
        data_source: DATA_SOURCE.to_string(),
    }
}
