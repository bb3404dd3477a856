//! Wallet endpoints.

use api_types::wallet::{BalanceResponse, PayRequest, PayResponse};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use engine::{Currency, Money, TransferCmd};

use crate::{ServerError, convert::balances_to_api, server::ServerState};

pub async fn balance(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let balances = state.engine.balances(&user_id).await?;
    Ok(Json(BalanceResponse {
        user_id,
        balances: balances_to_api(balances),
    }))
}

/// Transfers between two existing wallets. Every failure, malformed bodies
/// and unknown accounts included, is a `400`.
pub async fn pay(
    State(state): State<ServerState>,
    payload: Result<Json<PayRequest>, JsonRejection>,
) -> Result<Json<PayResponse>, ServerError> {
    let Json(payload) = payload.map_err(|rejection| ServerError::Generic(rejection.body_text()))?;
    let amount: Money = payload.amount.parse().map_err(ServerError::Rejected)?;
    let currency = Currency::try_from(payload.currency.as_str()).map_err(ServerError::Rejected)?;

    let mut cmd = TransferCmd::new(&payload.from_user, &payload.to_user, currency, amount);
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    let receipt = state
        .engine
        .transfer_wallet(cmd)
        .await
        .map_err(ServerError::Rejected)?;

    tracing::info!(
        from = %payload.from_user,
        to = %payload.to_user,
        amount = %amount,
        %currency,
        "payment via api"
    );
    Ok(Json(PayResponse {
        message: format!(
            "{} paid {} {amount} {currency}",
            payload.from_user, payload.to_user
        ),
        from_balance: receipt.from_balance.to_string(),
        to_balance: receipt.to_balance.to_string(),
    }))
}
