use crate::api::attendance::{HistoryQuery, PaginatedSessionResponse};
use crate::attendance::PunchRequest;
use crate::attendance::geofence::ReferenceLocation;
use crate::attendance::status::AttendanceStatus;
use crate::model::attendance::{AttendanceSession, PunchLocation};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance Sessions

Daily check-in and check-out with geofencing.

- **Check-in** is accepted only within the configured radius of the employee's
  reference (branch) location. The first check-in of an employee without a
  reference location on file becomes that reference.
- **Status** is derived by the server: late check-in after the work start,
  late check-out after the work end, and `Low Work Hours` below the minimum
  day length, which takes precedence over lateness.

All endpoints require a **JWT Bearer** access token linked to an employee.
Reference locations can only be managed by **Admin** or **HR**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::get_reference,
        crate::api::attendance::set_reference
    ),
    components(
        schemas(
            AttendanceSession,
            AttendanceStatus,
            PunchLocation,
            PunchRequest,
            ReferenceLocation,
            HistoryQuery,
            PaginatedSessionResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
