use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use std::fmt;

/// Prefix used by model hooks to smuggle field validation failures through `DbErr::Custom`
pub const VALIDATION_PREFIX: &str = "Validation failed:";

/// Application errors surfaced by the SmartLab API
#[derive(Debug, Clone, PartialEq)]
pub enum BusinessError {
    /// Invalid user input (400 Bad Request)
    ValidationError { field: String, message: String },
    /// Business rule violations (422 Unprocessable Entity)
    BusinessRuleViolation { rule: String, message: String },
    /// Resource not found (404 Not Found)
    NotFound { resource: String, id: String },
    /// Duplicate resource (409 Conflict)
    Duplicate { resource: String, field: String },
    /// Downstream store or service failure (502 Bad Gateway)
    ExternalServiceError { service: String, message: String },
    /// Anything else (500 Internal Server Error)
    InternalError { message: String },
}

impl BusinessError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            BusinessError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BusinessError::BusinessRuleViolation { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BUSINESS_RULE_VIOLATION",
            ),
            BusinessError::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            BusinessError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE_RESOURCE"),
            BusinessError::ExternalServiceError { .. } => {
                (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR")
            }
            BusinessError::InternalError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            BusinessError::ValidationError { .. } => "ValidationError",
            BusinessError::BusinessRuleViolation { .. } => "BusinessRuleViolation",
            BusinessError::NotFound { .. } => "NotFound",
            BusinessError::Duplicate { .. } => "Duplicate",
            BusinessError::ExternalServiceError { .. } => "ExternalServiceError",
            BusinessError::InternalError { .. } => "InternalError",
        }
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessError::ValidationError { field, message } => {
                write!(f, "Validation failed for field '{field}': {message}")
            }
            BusinessError::BusinessRuleViolation { rule, message } => {
                write!(f, "Business rule '{rule}' violated: {message}")
            }
            BusinessError::NotFound { resource, id } => {
                write!(f, "{resource} with id '{id}' not found")
            }
            BusinessError::Duplicate { resource, field } => {
                write!(f, "{resource} with this {field} already exists")
            }
            BusinessError::ExternalServiceError { service, message } => {
                write!(f, "External service '{service}' error: {message}")
            }
            BusinessError::InternalError { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for BusinessError {}

impl IntoResponse for BusinessError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "type": self.type_name(),
            }
        }));

        (status, body).into_response()
    }
}

/// Translates `DbErr` into `BusinessError` with the resource context of the caller
pub struct ErrorMapper;

impl ErrorMapper {
    pub fn map_db_error(err: DbErr, context: &str) -> BusinessError {
        let resource = context.replace('_', " ");
        if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
            return BusinessError::Duplicate {
                resource,
                field: "name".to_string(),
            };
        }
        match err {
            DbErr::RecordNotFound(msg) => BusinessError::NotFound {
                resource,
                id: Self::extract_id_from_message(&msg),
            },
            DbErr::Custom(msg) => {
                if let Some(rest) = msg.strip_prefix(VALIDATION_PREFIX) {
                    let message = rest.trim().to_string();
                    let field = message
                        .split_whitespace()
                        .next()
                        .unwrap_or("unknown")
                        .to_string();
                    BusinessError::ValidationError { field, message }
                } else {
                    BusinessError::InternalError { message: msg }
                }
            }
            DbErr::Conn(conn_err) => BusinessError::ExternalServiceError {
                service: "database".to_string(),
                message: conn_err.to_string(),
            },
            DbErr::Exec(exec_err) => {
                let err_msg = exec_err.to_string();
                if err_msg.contains("UNIQUE constraint") || err_msg.contains("duplicate key") {
                    BusinessError::Duplicate {
                        resource,
                        field: "name".to_string(),
                    }
                } else {
                    BusinessError::InternalError { message: err_msg }
                }
            }
            _ => BusinessError::InternalError {
                message: err.to_string(),
            },
        }
    }

    /// Pull a quoted id or bare UUID out of a not-found message
    fn extract_id_from_message(msg: &str) -> String {
        if let Some(start_pos) = msg.find(" id '") {
            let after_id = &msg[start_pos + 5..];
            if let Some(end_pos) = after_id.find('\'') {
                return after_id[..end_pos].to_string();
            }
        }

        msg.split_whitespace()
            .map(|word| word.trim_matches('\'').trim_matches('"'))
            .find(|word| uuid::Uuid::parse_str(word).is_ok())
            .map_or_else(|| "unknown".to_string(), ToString::to_string)
    }
}

/// Build a `DbErr` that `ErrorMapper` turns back into a `ValidationError`
pub fn validation_db_error(field: &str, message: &str) -> DbErr {
    DbErr::Custom(format!("{VALIDATION_PREFIX} {field} {message}"))
}

#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        $crate::common::errors::BusinessError::ValidationError {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! business_rule_violation {
    ($rule:expr, $message:expr) => {
        $crate::common::errors::BusinessError::BusinessRuleViolation {
            rule: $rule.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::BusinessError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}

pub trait DbErrorExt {
    fn to_business_error(self, context: &str) -> BusinessError;
}

impl DbErrorExt for DbErr {
    fn to_business_error(self, context: &str) -> BusinessError {
        ErrorMapper::map_db_error(self, context)
    }
}

pub type BusinessResult<T> = Result<T, BusinessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_creation() {
        let err = validation_error!("min_value", "must not exceed max_value");
        assert!(matches!(err, BusinessError::ValidationError { .. }));
        assert_eq!(
            err.to_string(),
            "Validation failed for field 'min_value': must not exceed max_value"
        );
    }

    #[test]
    fn test_validation_db_error_round_trip() {
        let db_err = validation_db_error("target_value", "must be between min_value and max_value");
        let business_err = db_err.to_business_error("product_parameter");

        match business_err {
            BusinessError::ValidationError { field, message } => {
                assert_eq!(field, "target_value");
                assert!(message.contains("between min_value and max_value"));
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_mapper_not_found() {
        let db_err = DbErr::RecordNotFound("Analysis session with id 'abc-123' not found".to_string());
        let business_err = ErrorMapper::map_db_error(db_err, "analysis_session");

        assert_eq!(
            business_err,
            BusinessError::NotFound {
                resource: "analysis session".to_string(),
                id: "abc-123".to_string(),
            }
        );
    }

    #[test]
    fn test_error_mapper_not_found_bare_uuid() {
        let id = uuid::Uuid::new_v4();
        let db_err = DbErr::RecordNotFound(format!("Product {id} not found"));
        match ErrorMapper::map_db_error(db_err, "product") {
            BusinessError::NotFound { id: found, .. } => assert_eq!(found, id.to_string()),
            other => panic!("Expected not found error, got {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (validation_error!("name", "too short"), StatusCode::BAD_REQUEST),
            (
                business_rule_violation!("specs_loaded", "no parameters"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (not_found!("product", "x"), StatusCode::NOT_FOUND),
            (
                BusinessError::ExternalServiceError {
                    service: "result store".to_string(),
                    message: "down".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
