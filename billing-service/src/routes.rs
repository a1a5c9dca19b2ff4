use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use time::Date;

use billing_engine::domain::{ClientStatistics, Concept, ConceptLine, Invoice, SystemLoad};
use billing_engine::{BillingEngine, BillingError, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BillingEngine<PgStore>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/clients/:id", get(get_client))
        .route("/clients/:id/invoice/:year/:month", get(get_invoice))
        .route(
            "/clients/:id/concepts/:concept/:year/:month",
            get(get_concept),
        )
        .route("/clients/:id/statistics", get(get_statistics))
        .route("/system-load/:date", get(get_system_load))
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Billing(#[from] BillingError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Billing(err) => match err {
                BillingError::InvalidCalendarInput(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                // Distinct messages let callers tell a missing client
                // apart from a tariff-data gap.
                BillingError::CustomerNotFound(_) | BillingError::TariffNotFound { .. } => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                BillingError::Computation(_) => {
                    tracing::error!(error = %err, "billing computation failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal billing failure".to_string(),
                    )
                }
            },
        };

        metrics::counter!("billing_api_errors_total").increment(1);
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ClientInfo {
    client_id: i64,
    market_id: i64,
    demand_class: i32,
    voltage_level: i32,
}

async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> Result<Json<ClientInfo>, ApiError> {
    metrics::counter!("billing_api_requests_total").increment(1);

    let service = state.engine.service(client_id).await?;
    Ok(Json(ClientInfo {
        client_id: service.service_id,
        market_id: service.market_id,
        demand_class: service.demand_class,
        voltage_level: service.voltage_level,
    }))
}

async fn get_invoice(
    State(state): State<AppState>,
    Path((client_id, year, month)): Path<(i64, i32, u8)>,
) -> Result<Json<Invoice>, ApiError> {
    metrics::counter!("billing_api_requests_total").increment(1);

    let invoice = state.engine.invoice(client_id, year, month).await?;
    Ok(Json(invoice))
}

async fn get_concept(
    State(state): State<AppState>,
    Path((client_id, concept, year, month)): Path<(i64, String, i32, u8)>,
) -> Result<Json<ConceptLine>, ApiError> {
    metrics::counter!("billing_api_requests_total").increment(1);

    let concept = Concept::from_str(&concept).map_err(ApiError::BadRequest)?;
    let line = state.engine.concept(concept, client_id, year, month).await?;
    Ok(Json(line))
}

async fn get_statistics(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> Result<Json<ClientStatistics>, ApiError> {
    metrics::counter!("billing_api_requests_total").increment(1);

    let stats = state.engine.client_statistics(client_id).await?;
    Ok(Json(stats))
}

async fn get_system_load(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<SystemLoad>, ApiError> {
    metrics::counter!("billing_api_requests_total").increment(1);

    let format = time::macros::format_description!("[year]-[month]-[day]");
    let date = Date::parse(&date, format)
        .map_err(|e| ApiError::BadRequest(format!("invalid date '{date}': {e}")))?;

    let load = state.engine.system_load(date).await?;
    Ok(Json(load))
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_engine::StoreError;

    #[test]
    fn concept_path_segment_parses_case_insensitively() {
        assert_eq!(Concept::from_str("EE2").unwrap(), Concept::Ee2);
        assert_eq!(Concept::from_str("ea").unwrap(), Concept::Ea);
        assert!(Concept::from_str("ee3").is_err());
    }

    #[test]
    fn customer_and_tariff_gaps_map_to_not_found() {
        let res = ApiError::from(BillingError::CustomerNotFound(1)).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = ApiError::from(BillingError::TariffNotFound {
            market_id: 1,
            voltage_level: 1,
            demand_class: Some(2),
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn calendar_errors_map_to_bad_request() {
        let res = ApiError::from(BillingError::InvalidCalendarInput("month 13".into()))
            .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failures_map_to_internal_server_error() {
        let res = ApiError::from(BillingError::Computation(StoreError(
            "connection refused".into(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
