//! Cache Health
//!
//! Turns raw [`CacheStats`] into an operator-facing assessment with
//! recommendations.

use serde::Serialize;

use super::lru::CacheStats;

/// Overall cache health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// Hit ratio above 50%
    Healthy,
    /// Working, but serving too many misses
    Degraded,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        *self == HealthStatus::Healthy
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Degraded => write!(f, "Degraded"),
        }
    }
}

/// Hit-ratio grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Efficiency {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Efficiency {
    fn from_hit_ratio(hit_ratio: f64) -> Self {
        if hit_ratio >= 80.0 {
            Efficiency::Excellent
        } else if hit_ratio >= 60.0 {
            Efficiency::Good
        } else if hit_ratio >= 40.0 {
            Efficiency::Fair
        } else {
            Efficiency::Poor
        }
    }
}

/// Capacity-usage grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryUsage {
    Optimal,
    High,
    Critical,
}

impl MemoryUsage {
    fn from_utilization(utilization: f64) -> Self {
        if utilization <= 80.0 {
            MemoryUsage::Optimal
        } else if utilization <= 95.0 {
            MemoryUsage::High
        } else {
            MemoryUsage::Critical
        }
    }
}

/// Health assessment for one cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealthReport {
    pub status: HealthStatus,
    pub efficiency: Efficiency,
    pub memory_usage: MemoryUsage,
    /// Entry count as a percentage of capacity
    pub utilization: f64,
    pub recommendations: Vec<String>,
    pub stats: CacheStats,
}

impl CacheHealthReport {
    pub fn from_stats(stats: CacheStats) -> Self {
        let utilization = crate::round_to(stats.utilization(), 2);
        let mut recommendations = Vec::new();

        if stats.hit_ratio < 60.0 {
            recommendations.push("Consider increasing cache size for better hit ratio".to_string());
        }
        if stats.evictions as f64 > stats.hits as f64 * 0.1 {
            recommendations
                .push("High eviction rate detected - cache size may be too small".to_string());
        }
        if utilization > 90.0 {
            recommendations
                .push("Cache utilization is high - monitor for performance impact".to_string());
        }
        if recommendations.is_empty() {
            recommendations.push("Cache performance is optimal".to_string());
        }

        Self {
            status: if stats.hit_ratio > 50.0 {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            efficiency: Efficiency::from_hit_ratio(stats.hit_ratio),
            memory_usage: MemoryUsage::from_utilization(utilization),
            utilization,
            recommendations,
            stats,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
