use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub usd: f64,
    pub usd_market_cap: f64,
    pub usd_24h_change: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MiningPoolShare {
    pub name: String,
    pub hash_rate_percent: f64,
    pub block_count: u64,
    pub rank: u32,
    pub link: String,
}

/// Raw mining-pool data as returned by the fetcher, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolDistribution {
    pub pools: Vec<MiningPoolShare>,
    pub total_blocks: u64,
    pub network_hash_rate: Option<Value>,
}

/// Normalized pool data produced by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSummary {
    pub pools: Vec<MiningPoolShare>,
    pub top_pools_combined: f64,
    pub total_blocks: u64,
    pub network_hash_rate: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum AttackStatus {
    #[serde(rename = "Very Low Risk")]
    VeryLow,
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AttackRecord {
    pub name: String,
    pub description: String,
    pub probability: f64,
    pub severity: Severity,
    pub status: AttackStatus,
    pub last_occurrence: String,
    pub mitigation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct RiskSummary {
    pub total_risk_score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Serialize)]
pub struct AttackReport {
    pub success: bool,
    pub bitcoin_data: PriceSnapshot,
    pub attacks: Vec<AttackRecord>,
    pub mining_pools: Vec<MiningPoolShare>,
    pub top_pools_combined: f64,
    pub attack_51_probability: f64,
    pub total_blocks_24h: u64,
    pub total_risk_score: f64,
    pub risk_level: RiskLevel,
    pub timestamp: String,
    pub network_hash_rate: String,
    pub network_nodes: String,
    pub block_height: String,
    pub data_source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UiSettings {
    pub font_size: String,
    pub font_family: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: "16px".to_string(),
            font_family: "Arial, sans-serif".to_string(),
            primary_color: "#2c3e50".to_string(),
            secondary_color: "#3498db".to_string(),
            background_color: "#ecf0f1".to_string(),
            text_color: "#2c3e50".to_string(),
        }
    }
}
