//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use orgchart_core::{Error as DomainError, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// A hierarchy, authorization or uniqueness rule rejected the request.
  #[error(transparent)]
  Domain(#[from] DomainError),

  #[error("authentication required")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Split a backend error into a rule violation or an infrastructure
  /// failure.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.into_domain() {
      Ok(domain) => Self::Domain(domain),
      Err(other) => Self::Store(Box::new(other)),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Domain(e) => domain_status(e),
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Internal(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::Domain(e) => e.kind(),
      Self::Unauthorized => "unauthorized",
      Self::Forbidden(_) => "forbidden",
      Self::NotFound(_) => "not_found",
      Self::Internal(_) | Self::Store(_) => "internal",
    }
  }
}

fn domain_status(err: &DomainError) -> StatusCode {
  use DomainError::*;
  match err {
    InvalidRole(_)
    | SelfManagement(_)
    | ManagerNotFound(_)
    | RankViolation { .. }
    | CeoMustHaveNoManager
    | CannotPromoteFurther(_)
    | Validation(_) => StatusCode::BAD_REQUEST,
    InsufficientPermission { .. } => StatusCode::FORBIDDEN,
    EmployeeNotFound(_) | AccountNotFound(_) => StatusCode::NOT_FOUND,
    HasSubordinates { .. }
    | DuplicateEmployeeNumber(_)
    | DuplicateEmail(_)
    | EmailTaken(_)
    | EmployeeAlreadyLinked(_) => StatusCode::CONFLICT,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut body = json!({ "error": self.to_string(), "kind": self.kind() });
    if let Self::Domain(DomainError::HasSubordinates { subordinates, .. }) = &self {
      body["subordinates"] = json!(subordinates);
    }

    let mut res = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"orgchart\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use orgchart_core::{employee::EmployeeId, policy::Action, role::Role};

  use super::*;

  #[test]
  fn domain_kinds_map_to_statuses() {
    let cases = [
      (DomainError::CeoMustHaveNoManager, StatusCode::BAD_REQUEST),
      (
        DomainError::InsufficientPermission { action: Action::Delete, target: Role::Cto },
        StatusCode::FORBIDDEN,
      ),
      (DomainError::EmployeeNotFound(EmployeeId(3)), StatusCode::NOT_FOUND),
      (DomainError::DuplicateEmail("a@b.c".into()), StatusCode::CONFLICT),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
