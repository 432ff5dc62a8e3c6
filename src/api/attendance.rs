use actix_web::{HttpResponse, web};

use crate::error::ApiResult;
use crate::model::attendance::{AttendanceQuery, CreateAttendance};
use crate::state::AppState;

/// List attendance records, most recent date first
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Matching attendance records", body = [Attendance]),
        (status = 400, description = "Unparsable filter", body = Object, example = json!({
            "status": "\"Late\" is not a valid choice."
        }))
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    state: web::Data<AppState>,
    query: web::Query<AttendanceQuery>,
) -> ApiResult<HttpResponse> {
    let records = state.attendance.list(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Mark attendance for one employee on one day
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = Attendance),
        (status = 400, description = "Invalid input or already marked", body = Object, example = json!({
            "date": "Attendance for this employee on 2024-01-01 already exists."
        }))
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    state: web::Data<AppState>,
    payload: web::Json<CreateAttendance>,
) -> ApiResult<HttpResponse> {
    let record = state.attendance.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(record))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 204, description = "Successfully deleted"),
        (status = 404, description = "Record not found", body = Object, example = json!({
            "detail": "Not found."
        }))
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    state.attendance.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Present/absent totals per employee
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    responses(
        (status = 200, description = "Per-employee totals", body = [AttendanceSummary])
    ),
    tag = "Attendance"
)]
pub async fn attendance_summary(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let summary = state.attendance.summary().await?;
    Ok(HttpResponse::Ok().json(summary))
}
