use actix_web::{HttpResponse, web};

use crate::error::ApiResult;
use crate::model::employee::CreateEmployee;
use crate::state::AppState;

/// List employees, newest first
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All employees", body = [Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let employees = state.employees.list().await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid or duplicate input", body = Object, example = json!({
            "email": "employee with this email already exists."
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    state: web::Data<AppState>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<HttpResponse> {
    let employee = state.employees.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(employee))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Not found."
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let employee = state.employees.retrieve(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Delete Employee together with its attendance records
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 204, description = "Successfully deleted"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Not found."
        }))
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    state.employees.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Employee totals per department
#[utoipa::path(
    get,
    path = "/api/employees/summary",
    responses(
        (status = 200, description = "Headcount summary", body = EmployeeSummary)
    ),
    tag = "Employee"
)]
pub async fn employee_summary(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let summary = state.employees.summary().await?;
    Ok(HttpResponse::Ok().json(summary))
}
