//! Business endpoints used by the game integration.

use api_types::business::{BusinessList, BusinessView, CollectResponse};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;

use crate::{
    ServerError,
    convert::{balances_to_api, currency_to_api},
    server::ServerState,
};

pub async fn list(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<BusinessList>, ServerError> {
    let views = state.engine.businesses_of(&user_id, Utc::now()).await?;
    let businesses = views
        .into_iter()
        .map(|view| BusinessView {
            id: view.business.id,
            kind: view.business.kind,
            currency: currency_to_api(view.business.currency),
            profit_per_period: view.business.profit_per_period.to_string(),
            pending_profit: view.pending_profit.to_string(),
            last_collected_at: view.business.last_collected_at,
        })
        .collect();
    Ok(Json(BusinessList {
        user_id,
        businesses,
    }))
}

pub async fn collect(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<CollectResponse>, ServerError> {
    let report = state.engine.collect_profit(&user_id, Utc::now()).await?;
    Ok(Json(CollectResponse {
        user_id,
        collected: balances_to_api(report.collected),
        businesses: report.businesses,
    }))
}
