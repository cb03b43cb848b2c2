//! CSV export of observations and reports

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use nmon_common::models::ReportStatus;
use serde::Serialize;
use tracing::info;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services::noise_filter::{single_value, NoiseFilter};
use crate::AppState;

const OBSERVATION_HEADERS: [&str; 6] = [
    "obs_id",
    "zone_id",
    "timestamp",
    "source",
    "value_db",
    "category_tag",
];

const REPORT_HEADERS: [&str; 8] = [
    "report_id",
    "zone_id",
    "timestamp",
    "category",
    "time_window",
    "description",
    "status",
    "moderation_reason",
];

/// Write `rows` as CSV under a fixed header line
///
/// The header is written even when there are no rows.
pub fn to_csv<T: Serialize>(headers: &[&str], rows: &[T]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// GET /api/export/csv?type=observations|reports
///
/// Observations honour the noise query filters, reports honour `status`.
pub async fn export_csv(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(pairs) = query?;
    let data_type = single_value(&pairs, "type").unwrap_or("observations");

    let (bytes, rows) = match data_type {
        "observations" => {
            let filter = NoiseFilter::from_pairs(&pairs)?;
            let observations = db::observations::query_observations(&state.db, &filter).await?;
            (to_csv(&OBSERVATION_HEADERS, &observations), observations.len())
        }
        "reports" => {
            let status = single_value(&pairs, "status")
                .map(str::parse::<ReportStatus>)
                .transpose()?;
            let reports = db::reports::list_reports(&state.db, status).await?;
            (to_csv(&REPORT_HEADERS, &reports), reports.len())
        }
        other => {
            return Err(ApiError::BadRequest(format!(
                "Invalid export type {:?}; expected observations or reports",
                other
            )))
        }
    };
    let bytes = bytes.map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))?;
    info!(data_type, rows, "CSV export");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", data_type),
            ),
        ],
        bytes,
    )
        .into_response())
}
