use crate::attendance::AttendanceError;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::models::TokenType;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    /// Decodes a bearer token into the calling user. Refresh tokens are refused.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, String> {
        let claims = verify_token(token, secret)?;

        if claims.token_type != TokenType::Access {
            return Err("Access token required".to_string());
        }

        let role = Role::from_id(claims.role).ok_or_else(|| "Invalid role".to_string())?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already decoded by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        ready(AuthUser::from_token(token, &config.jwt_secret).map_err(ErrorUnauthorized))
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> Result<(), AttendanceError> {
        if matches!(self.role, Role::Admin | Role::Hr) {
            Ok(())
        } else {
            Err(AttendanceError::Forbidden("HR/Admin only"))
        }
    }

    /// The employee profile linked to this user.
    pub fn employee_id(&self) -> Result<u64, AttendanceError> {
        self.employee_id
            .ok_or(AttendanceError::Forbidden("No employee profile"))
    }

    /// Which employee's records the caller may read: their own, or anyone's for HR/Admin.
    pub fn resolve_employee(&self, requested: Option<u64>) -> Result<u64, AttendanceError> {
        match requested {
            Some(id) if Some(id) != self.employee_id => {
                self.require_hr_or_admin()?;
                Ok(id)
            }
            _ => self.employee_id(),
        }
    }
}
