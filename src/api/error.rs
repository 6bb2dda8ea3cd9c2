use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::error::LeaveError;

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::NotFound(_) | LeaveError::NoBalanceRecord(_) => StatusCode::NOT_FOUND,
            LeaveError::Validation(_) | LeaveError::InvalidDateRange => StatusCode::BAD_REQUEST,
            LeaveError::OverlappingRequest { .. } | LeaveError::InvalidState(_) => StatusCode::CONFLICT,
            LeaveError::InsufficientBalance { .. } | LeaveError::NoEligibleEmployees => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LeaveError::Storage(e) => {
                tracing::error!(error = %e, "Leave storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_balance::BalanceKey;
    use rust_decimal::Decimal;

    #[test]
    fn each_kind_has_a_stable_status() {
        let cases = [
            (LeaveError::not_found("leave request 1"), StatusCode::NOT_FOUND),
            (LeaveError::validation("bad"), StatusCode::BAD_REQUEST),
            (LeaveError::InvalidDateRange, StatusCode::BAD_REQUEST),
            (LeaveError::OverlappingRequest { existing_id: 3 }, StatusCode::CONFLICT),
            (
                LeaveError::InsufficientBalance {
                    available: Decimal::ONE,
                    requested: Decimal::TWO,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (LeaveError::invalid_state("done"), StatusCode::CONFLICT),
            (LeaveError::forbidden("no"), StatusCode::FORBIDDEN),
            (LeaveError::NoEligibleEmployees, StatusCode::UNPROCESSABLE_ENTITY),
            (
                LeaveError::NoBalanceRecord(BalanceKey::new(1, "CL", 2026)),
                StatusCode::NOT_FOUND,
            ),
            (LeaveError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[actix_web::test]
    async fn storage_details_are_not_leaked() {
        let response = LeaveError::Storage("password=hunter2".into()).error_response();
        let body = actix_web::body::to_bytes(response.into_body())
            .await
            .expect("body");
        assert_eq!(
            std::str::from_utf8(&body).expect("utf8"),
            r#"{"message":"Internal Server Error"}"#
        );
    }
}
