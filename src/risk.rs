//! Attack-probability aggregation over fetched network data.
//!
//! The 51% attack probability is a piecewise-linear heuristic on the combined
//! share of the two largest pools. It is meant for illustrative display and is
//! not a statistically derived security metric.

use serde_json::Value;
use std::cmp::Ordering;

use crate::models::{
    AttackRecord, AttackStatus, MiningPoolShare, PoolDistribution, PoolSummary, RiskLevel,
    RiskSummary, Severity,
};

pub const FALLBACK_TOP_POOLS_COMBINED: f64 = 50.8;
pub const FALLBACK_HASH_RATE: &str = "~500 EH/s (estimated)";

const MIN_ATTACK_51_PROBABILITY: f64 = 0.1;
const MAX_ATTACK_51_PROBABILITY: f64 = 5.0;
const HASHES_PER_EXAHASH: f64 = 1e18;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn summarize_pools(distribution: PoolDistribution) -> PoolSummary {
    let PoolDistribution {
        mut pools,
        total_blocks,
        network_hash_rate,
    } = distribution;

    let live = !pools.is_empty() && total_blocks > 0;
    if live {
        for pool in pools.iter_mut() {
            pool.hash_rate_percent =
                round2(pool.block_count as f64 / total_blocks as f64 * 100.0);
        }
    }

    // Stable sort keeps equal shares adjacent in upstream order.
    pools.sort_by(|a, b| {
        b.hash_rate_percent
            .partial_cmp(&a.hash_rate_percent)
            .unwrap_or(Ordering::Equal)
    });

    let top_pools_combined = if live {
        round2(top_two_share(&pools))
    } else {
        FALLBACK_TOP_POOLS_COMBINED
    };

    PoolSummary {
        pools,
        top_pools_combined,
        total_blocks,
        network_hash_rate,
    }
}

fn top_two_share(sorted: &[MiningPoolShare]) -> f64 {
    sorted.iter().take(2).map(|p| p.hash_rate_percent).sum()
}

pub fn attack_51_probability(top_pools_combined: f64) -> f64 {
    let raw = if top_pools_combined > 50.0 {
        ((top_pools_combined - 50.0) * 0.5).min(MAX_ATTACK_51_PROBABILITY)
    } else {
        ((50.0 - top_pools_combined) * 0.1).max(MIN_ATTACK_51_PROBABILITY)
    };
    raw.clamp(MIN_ATTACK_51_PROBABILITY, MAX_ATTACK_51_PROBABILITY)
}

pub fn attack_51_status(probability: f64) -> AttackStatus {
    if probability < 2.0 {
        AttackStatus::Low
    } else if probability < 4.0 {
        AttackStatus::Medium
    } else {
        AttackStatus::High
    }
}

fn record(
    name: &str,
    description: &str,
    probability: f64,
    severity: Severity,
    status: AttackStatus,
    last_occurrence: &str,
    mitigation: &str,
) -> AttackRecord {
    AttackRecord {
        name: name.to_string(),
        description: description.to_string(),
        probability,
        severity,
        status,
        last_occurrence: last_occurrence.to_string(),
        mitigation: mitigation.to_string(),
    }
}

/// The full attack table: the live 51% record followed by the fixed ones.
/// The status is bucketed on the unrounded probability; the record carries
/// it rounded to 2 decimals.
pub fn attack_records(top_pools_combined: f64, attack_51_probability: f64) -> Vec<AttackRecord> {
    vec![
        record(
            "51% Attack",
            "A miner or coalition controlling the majority of network hash rate can rewrite recent blocks and double-spend",
            round2(attack_51_probability),
            Severity::Critical,
            attack_51_status(attack_51_probability),
            "Never on Bitcoin (Ethereum Classic, 2020)",
            &format!(
                "Top 2 mining pools control {:.1}% of hash rate; pool decentralization and miner switching keep control below 50%",
                top_pools_combined
            ),
        ),
        record(
            "Double Spending",
            "Spending the same coins twice by exploiting unconfirmed transactions or chain reorganizations",
            0.5,
            Severity::High,
            AttackStatus::Low,
            "2013 (accidental fork during v0.8 upgrade)",
            "Wait for 6 confirmations before accepting high-value payments",
        ),
        record(
            "Eclipse Attack",
            "Isolating a node by monopolizing its peer connections to feed it a false view of the chain",
            1.0,
            Severity::Medium,
            AttackStatus::Low,
            "2015 (academic demonstration)",
            "Diverse outbound peers, anchor connections and peer address bucketing",
        ),
        record(
            "Sybil Attack",
            "Flooding the peer-to-peer network with many fake identities to influence message relay",
            1.0,
            Severity::Medium,
            AttackStatus::Low,
            "Ongoing low-level attempts",
            "Proof-of-work cost and connection limits per network group",
        ),
        record(
            "Selfish Mining",
            "Withholding mined blocks to waste honest miners' work and earn a disproportionate share of rewards",
            1.5,
            Severity::High,
            AttackStatus::Low,
            "Theoretical (Eyal & Sirer, 2013)",
            "Monitoring stale block rates and uniform tie-breaking between competing blocks",
        ),
        record(
            "Transaction Malleability",
            "Altering a transaction's identifier before confirmation without invalidating its signature",
            0.1,
            Severity::Low,
            AttackStatus::VeryLow,
            "2014 (Mt. Gox incident)",
            "Segregated Witness (SegWit) activated in 2017",
        ),
    ]
}

pub fn risk_summary(attacks: &[AttackRecord]) -> RiskSummary {
    let total_risk_score = round2(attacks.iter().map(|a| a.probability).sum());
    let risk_level = if total_risk_score < 5.0 {
        RiskLevel::Low
    } else if total_risk_score < 10.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    };
    RiskSummary {
        total_risk_score,
        risk_level,
    }
}

/// Formats a raw hashes/second value as exahashes/second.
pub fn format_hash_rate(raw: Option<&Value>) -> String {
    let hashes = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match hashes.filter(|h| h.is_finite()) {
        Some(h) => format!("~{:.1} EH/s", h / HASHES_PER_EXAHASH),
        None => FALLBACK_HASH_RATE.to_string(),
    }
}
