//! Database repository functions for markets and bets.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Bet, BetSide, BetStatus, Market, MarketStatus};

const MARKET_COLUMNS: &str = "id, outcome_ref, question, topic, app_id, yes_total, no_total, \
     status, created_at, updated_at, last_synced_at";

/// Get all active markets, oldest first.
pub async fn get_active_markets(pool: &PgPool) -> Result<Vec<Market>, sqlx::Error> {
    let query = format!(
        "SELECT {MARKET_COLUMNS} FROM markets WHERE status = 'active' ORDER BY created_at ASC"
    );

    sqlx::query_as::<_, Market>(&query).fetch_all(pool).await
}

/// Get a market by its stable outcome reference.
pub async fn get_market_by_outcome_ref(
    pool: &PgPool,
    outcome_ref: &str,
) -> Result<Option<Market>, sqlx::Error> {
    let query = format!("SELECT {MARKET_COLUMNS} FROM markets WHERE outcome_ref = $1");

    sqlx::query_as::<_, Market>(&query)
        .bind(outcome_ref)
        .fetch_optional(pool)
        .await
}

/// Overwrite a market's cached pool totals and mirrored status.
///
/// Also stamps last_synced_at. outcome_ref is deliberately not part of this
/// statement: it is a local-authority field and must survive whatever the
/// ledger reports.
pub async fn update_pool_totals(
    pool: &PgPool,
    market_id: Uuid,
    yes_total: Decimal,
    no_total: Decimal,
    status: MarketStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE markets
        SET yes_total = $2,
            no_total = $3,
            status = $4,
            last_synced_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(market_id)
    .bind(yes_total)
    .bind(no_total)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a new stake on one side of a market.
pub async fn insert_bet(
    pool: &PgPool,
    market_id: Uuid,
    side: BetSide,
    amount: Decimal,
) -> Result<Uuid, sqlx::Error> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO bets (market_id, side, amount, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING id
        "#,
    )
    .bind(market_id)
    .bind(side.as_str())
    .bind(amount)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get all bets placed on a market, oldest first.
pub async fn get_bets_for_market(
    pool: &PgPool,
    market_id: Uuid,
) -> Result<Vec<Bet>, sqlx::Error> {
    sqlx::query_as::<_, Bet>(
        r#"
        SELECT id, market_id, side, amount, status, placed_at
        FROM bets
        WHERE market_id = $1
        ORDER BY placed_at ASC
        "#,
    )
    .bind(market_id)
    .fetch_all(pool)
    .await
}

/// Settle all pending bets on a resolved market.
///
/// Returns (won, lost) row counts. Claim and refund transitions happen
/// elsewhere; this only splits pending stakes by the winning side.
pub async fn settle_bets_for_market(
    pool: &PgPool,
    market_id: Uuid,
    winning_side: BetSide,
) -> Result<(u64, u64), sqlx::Error> {
    let won = sqlx::query(
        r#"
        UPDATE bets
        SET status = $3
        WHERE market_id = $1 AND status = 'pending' AND side = $2
        "#,
    )
    .bind(market_id)
    .bind(winning_side.as_str())
    .bind(BetStatus::Won.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    let lost = sqlx::query(
        r#"
        UPDATE bets
        SET status = $3
        WHERE market_id = $1 AND status = 'pending' AND side != $2
        "#,
    )
    .bind(market_id)
    .bind(winning_side.as_str())
    .bind(BetStatus::Lost.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    Ok((won, lost))
}
