use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::attendance::geofence::ReferenceLocation;
use crate::attendance::service::page_window;
use crate::attendance::{AttendanceError, AttendanceService, PunchRequest};
use crate::auth::auth::AuthUser;
use crate::clock::Clock;
use crate::model::attendance::{AttendanceSession, SessionQuery};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    #[schema(example = "2026-03-01", value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,

    #[schema(example = "2026-03-31", value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,

    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 20)]
    pub per_page: Option<u32>,

    /// HR/Admin only: another employee's history.
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedSessionResponse {
    pub data: Vec<AttendanceSession>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkin",
    request_body = PunchRequest,
    responses(
        (status = 201, description = "Checked in successfully", body = AttendanceSession),
        (status = 400, description = "Missing location, outside the geofence or already checked in", body = Object, example = json!({
            "error": "GEOFENCE_REJECTED",
            "message": "You are 1552 m away from Bangalore HQ. Check-in is allowed within 300 m"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<PunchRequest>,
) -> Result<impl Responder, AttendanceError> {
    let employee_id = auth.employee_id()?;

    let session = service
        .check_in(employee_id, payload.into_inner(), clock.now())
        .await?;

    Ok(HttpResponse::Created().json(session))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/checkout",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceSession),
        (status = 400, description = "Already checked out today", body = Object, example = json!({
            "error": "ALREADY_CHECKED_OUT",
            "message": "Already checked out today"
        })),
        (status = 404, description = "No check-in found for today", body = Object, example = json!({
            "error": "SESSION_NOT_FOUND",
            "message": "No check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<PunchRequest>,
) -> Result<impl Responder, AttendanceError> {
    let employee_id = auth.employee_id()?;

    let session = service
        .check_out(employee_id, payload.into_inner(), clock.now())
        .await?;

    Ok(HttpResponse::Ok().json(session))
}

#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's session", body = AttendanceSession),
        (status = 404, description = "No check-in found for today"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    clock: web::Data<dyn Clock>,
) -> Result<impl Responder, AttendanceError> {
    let session = service.today(auth.employee_id()?, clock.now()).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance history, newest first", body = PaginatedSessionResponse),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "HR/Admin only for other employees")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<HistoryQuery>,
) -> Result<impl Responder, AttendanceError> {
    let employee_id = auth.resolve_employee(query.employee_id)?;
    let (page, per_page, offset) = page_window(query.page, query.per_page);

    let (data, total) = service
        .history(SessionQuery {
            employee_id,
            from: query.from,
            to: query.to,
            limit: per_page,
            offset,
        })
        .await?;

    Ok(HttpResponse::Ok().json(PaginatedSessionResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/reference/{employee_id}",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Reference location on file", body = ReferenceLocation),
        (status = 404, description = "No reference location set"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_reference(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> Result<impl Responder, AttendanceError> {
    auth.require_hr_or_admin()?;

    let location = service.reference(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(location))
}

#[utoipa::path(
    put,
    path = "/api/attendance/reference/{employee_id}",
    request_body = ReferenceLocation,
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Reference location saved", body = ReferenceLocation),
        (status = 400, description = "Invalid coordinates"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn set_reference(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    body: web::Json<ReferenceLocation>,
) -> Result<impl Responder, AttendanceError> {
    auth.require_hr_or_admin()?;

    let location = service
        .set_reference(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(location))
}
