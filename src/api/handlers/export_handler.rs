use axum::{
    Json,
    http::header,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::dto::export_dto::ExportRequest,
    error::Result,
    services::export::{to_csv, to_ics},
};

const CSV_FILENAME: &str = "attachment; filename=\"avis_selection.csv\"";
const EXCEL_FILENAME: &str = "attachment; filename=\"avis_selection.xls\"";
const ICS_FILENAME: &str = "attachment; filename=\"avis_selection.ics\"";

/// `POST /export/csv`
pub async fn export_csv(Json(request): Json<ExportRequest>) -> Result<impl IntoResponse> {
    debug!("Exporting {} items as CSV", request.items.len());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, CSV_FILENAME),
        ],
        to_csv(&request.items)?,
    ))
}

/// `POST /export/excel`，内容同 CSV，仅 MIME 与文件名不同
pub async fn export_excel(Json(request): Json<ExportRequest>) -> Result<impl IntoResponse> {
    debug!("Exporting {} items for Excel", request.items.len());
    Ok((
        [
            (header::CONTENT_TYPE, "application/vnd.ms-excel"),
            (header::CONTENT_DISPOSITION, EXCEL_FILENAME),
        ],
        to_csv(&request.items)?,
    ))
}

/// `POST /export/ics`
pub async fn export_ics(Json(request): Json<ExportRequest>) -> impl IntoResponse {
    debug!("Exporting {} items as iCalendar", request.items.len());
    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (header::CONTENT_DISPOSITION, ICS_FILENAME),
        ],
        to_ics(&request.items),
    )
}
