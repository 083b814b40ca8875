use super::AppState;
use crate::error::BillingError;
use crate::models::{
    ApprovalSummary, BoqItem, InvoiceSummary, NewBoqItem, NewProject, Project, ScheduleLine,
    StageRequest, StageResult, StagingEdit, StagingRow,
};
use crate::service::reports::write_schedule_csv;
use crate::sheet;
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

/// 暂存行批量编辑响应体
#[derive(Debug, Serialize)]
pub struct UpdateStagingResponse {
    pub success: bool,
    pub updated_count: usize,
    pub message: String,
}

/// CSV 上传参数 (表格内容在请求体中)
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub project_id: i64,
    pub invoice_number: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub trade: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleParams {
    pub month: u32,
    pub year: i32,
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BillingError::NotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Conflict(_) => StatusCode::CONFLICT,
            BillingError::Validation(_) | BillingError::Csv(_) => StatusCode::BAD_REQUEST,
            BillingError::Database(_) | BillingError::Migrate(_) => {
                tracing::error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let response = ApiResponse {
            success: false,
            message: self.to_string(),
        };
        (status, Json(response)).into_response()
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, BillingError> {
    Ok(Json(state.catalog.list_projects().await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), BillingError> {
    let project = state.catalog.create_project(&req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Project>, BillingError> {
    Ok(Json(state.catalog.get_project(project_id).await?))
}

pub async fn list_boq_items(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<BoqItem>>, BillingError> {
    Ok(Json(state.catalog.list_boq_items(project_id).await?))
}

pub async fn add_boq_item(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(req): Json<NewBoqItem>,
) -> Result<(StatusCode, Json<BoqItem>), BillingError> {
    let item = state.catalog.add_boq_item(project_id, &req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// 暂存导入 (JSON 行)
pub async fn stage_invoice(
    State(state): State<AppState>,
    Json(req): Json<StageRequest>,
) -> Result<Json<StageResult>, BillingError> {
    Ok(Json(state.staging.stage_invoice(req).await?))
}

/// 暂存导入 (CSV 请求体, 自动识别列)
pub async fn upload_invoice(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: String,
) -> Result<Json<StageResult>, BillingError> {
    let rows = sheet::read_rows(body.as_bytes())?;
    let req = StageRequest {
        project_id: params.project_id,
        invoice_number: params.invoice_number,
        period_start: params.period_start,
        period_end: params.period_end,
        trade: params.trade,
        rows,
    };
    Ok(Json(state.staging.stage_invoice(req).await?))
}

pub async fn get_invoice_staging(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> Result<Json<Vec<StagingRow>>, BillingError> {
    Ok(Json(state.staging.list_staging_rows(invoice_id).await?))
}

pub async fn update_staging_rows(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
    Json(edits): Json<Vec<StagingEdit>>,
) -> Result<Json<UpdateStagingResponse>, BillingError> {
    let updated_count = state.staging.update_staging_rows(invoice_id, &edits).await?;
    Ok(Json(UpdateStagingResponse {
        success: true,
        updated_count,
        message: format!("Updated {} rows", updated_count),
    }))
}

/// 审批结算单
pub async fn approve_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> Result<Json<ApprovalSummary>, BillingError> {
    Ok(Json(state.approval.approve_invoice(invoice_id).await?))
}

pub async fn invoice_summary(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceSummary>, BillingError> {
    Ok(Json(state.reports.invoice_summary(invoice_id).await?))
}

/// 月度进度报表
pub async fn schedule_report(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<Vec<ScheduleLine>>, BillingError> {
    let lines = state
        .reports
        .schedule_report(project_id, params.month, params.year)
        .await?;
    Ok(Json(lines))
}

/// 月度进度报表 CSV 导出
pub async fn schedule_report_csv(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Query(params): Query<ScheduleParams>,
) -> Result<Response, BillingError> {
    let lines = state
        .reports
        .schedule_report(project_id, params.month, params.year)
        .await?;

    let mut buffer = Vec::new();
    write_schedule_csv(&lines, &mut buffer)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], buffer).into_response())
}
