use crate::model::role::{Actor, Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// Caller identity placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Admin only"))
        }
    }

    /// The employee acting on leave data. Users without an employee profile
    /// (service accounts) cannot own or approve requests.
    pub fn actor(&self) -> actix_web::Result<Actor> {
        let employee_id = self
            .employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;
        Ok(Actor::new(employee_id, self.role))
    }

    /// Employees only see their own requests; HR and admins see everyone's.
    pub fn can_view(&self, owner_employee_id: u64) -> bool {
        self.role.is_hr_or_admin() || self.employee_id == Some(owner_employee_id)
    }
}
