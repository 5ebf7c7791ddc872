//! Shared data models for markets and bets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Market lifecycle status.
///
/// Transitions are driven by the oracle/admin through the ledger; this
/// codebase only mirrors them into the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    Pending,
    Active,
    Frozen,
    Resolved,
    Cancelled,
}

impl MarketStatus {
    /// Get the status as a string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Pending => "pending",
            MarketStatus::Active => "active",
            MarketStatus::Frozen => "frozen",
            MarketStatus::Resolved => "resolved",
            MarketStatus::Cancelled => "cancelled",
        }
    }

    /// Parse status from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(MarketStatus::Pending),
            "active" => Some(MarketStatus::Active),
            "frozen" => Some(MarketStatus::Frozen),
            "resolved" => Some(MarketStatus::Resolved),
            "cancelled" => Some(MarketStatus::Cancelled),
            _ => None,
        }
    }

    /// Map the ledger's numeric status code to a local status.
    pub fn from_ledger_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MarketStatus::Pending),
            1 => Some(MarketStatus::Active),
            2 => Some(MarketStatus::Frozen),
            3 => Some(MarketStatus::Resolved),
            4 => Some(MarketStatus::Cancelled),
            _ => None,
        }
    }
}

/// Market topic metadata.
///
/// Older records store a plain label, newer ones a structured object;
/// both shapes live in the same jsonb column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarketTopic {
    Detailed { name: String, description: String },
    Label(String),
}

impl MarketTopic {
    /// Project the topic to its display string.
    pub fn display_label(&self) -> &str {
        match self {
            MarketTopic::Label(label) => label,
            MarketTopic::Detailed { name, .. } => name,
        }
    }
}

/// A binary-outcome market from the database.
///
/// `yes_total`/`no_total` are a cache of the ledger's pool state.
/// `outcome_ref` is locally owned and survives redeployment of the market
/// under a different `app_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Market {
    pub id: Uuid,
    pub outcome_ref: String,
    pub question: String,
    pub topic: Json<MarketTopic>,
    /// Ledger application id; None or non-positive means not yet deployed
    pub app_id: Option<i64>,
    pub yes_total: Decimal,
    pub no_total: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Market {
    /// Parsed lifecycle status.
    pub fn market_status(&self) -> Option<MarketStatus> {
        MarketStatus::from_str(&self.status)
    }
}

/// Side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetSide {
    Yes,
    No,
}

impl BetSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetSide::Yes => "yes",
            BetSide::No => "no",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yes" => Some(BetSide::Yes),
            "no" => Some(BetSide::No),
            _ => None,
        }
    }
}

/// Bet settlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Claimed,
    Refunded,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Claimed => "claimed",
            BetStatus::Refunded => "refunded",
        }
    }
}

/// A single stake placed on one side of a market.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bet {
    pub id: Uuid,
    pub market_id: Uuid,
    pub side: String,
    pub amount: Decimal,
    pub status: String,
    pub placed_at: DateTime<Utc>,
}
