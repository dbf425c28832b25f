//! Handlers for `/auth` endpoints.
//!
//! There are no sessions: clients send Basic credentials with every request.
//! `login` only confirms that a pair of credentials is valid.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use orgchart_core::{
  account::{Account, AccountRole, NewAccount},
  employee::{EmployeeId, EmployeeSummary},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Directory,
  auth::{CurrentAccount, authenticate, check_password_strength, hash_password},
  error::ApiError,
};

/// An account together with the employee it is linked to.
#[derive(Debug, Serialize)]
pub struct Profile {
  #[serde(flatten)]
  pub account:  Account,
  pub employee: Option<EmployeeSummary>,
}

fn validate_identity(email: &str, name: &str, password: &str) -> Result<(), ApiError> {
  if !email.contains('@') {
    return Err(orgchart_core::Error::Validation("a valid email is required".into()).into());
  }
  if name.trim().is_empty() {
    return Err(orgchart_core::Error::Validation("name is required".into()).into());
  }
  check_password_strength(password)
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub name:     String,
  pub password: String,
}

/// `POST /auth/register`
///
/// The very first account becomes an administrator; every later one is a
/// viewer until an administrator creates it otherwise.
pub async fn register<S: Directory>(
  State(store): State<Arc<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  let email = body.email.trim().to_owned();
  validate_identity(&email, &body.name, &body.password)?;

  let account = store
    .register_account(NewAccount {
      email,
      name: body.name.trim().to_owned(),
      password_hash: hash_password(&body.password)?,
      role: AccountRole::Viewer,
      employee_id: None,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(account = %account.account_id, role = ?account.role, "account registered");
  Ok((StatusCode::CREATED, Json(Profile { account, employee: None })))
}

// ─── Login / me ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S: Directory>(
  State(store): State<Arc<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Profile>, ApiError> {
  let account = authenticate(store.as_ref(), body.email.trim(), &body.password).await?;
  let employee = match account.employee_id {
    Some(id) => store
      .get_employee(id)
      .await
      .map_err(ApiError::store)?
      .map(|e| e.summary()),
    None => None,
  };
  Ok(Json(Profile { account, employee }))
}

/// `GET /auth/me`
pub async fn me(auth: CurrentAccount) -> Json<Profile> {
  Json(Profile {
    employee: auth.employee.as_ref().map(|e| e.summary()),
    account:  auth.account,
  })
}

// ─── Administration ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateAccountBody {
  pub email:       String,
  pub name:        String,
  pub password:    String,
  #[serde(default)]
  pub role:        AccountRole,
  pub employee_id: Option<i64>,
}

/// `POST /auth/accounts`
pub async fn create<S: Directory>(
  State(store): State<Arc<S>>,
  auth: CurrentAccount,
  Json(body): Json<CreateAccountBody>,
) -> Result<impl IntoResponse, ApiError> {
  auth.require_admin()?;
  let email = body.email.trim().to_owned();
  validate_identity(&email, &body.name, &body.password)?;

  let account = store
    .create_account(NewAccount {
      email,
      name: body.name.trim().to_owned(),
      password_hash: hash_password(&body.password)?,
      role: body.role,
      employee_id: body.employee_id.map(EmployeeId),
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(account = %account.account_id, by = %auth.account.account_id, "account created");
  Ok((StatusCode::CREATED, Json(account)))
}

#[derive(Debug, Deserialize)]
pub struct LinkBody {
  pub employee_id: Option<i64>,
}

/// `PUT /auth/accounts/:id/employee`: `{"employee_id": null}` unlinks.
pub async fn link<S: Directory>(
  State(store): State<Arc<S>>,
  auth: CurrentAccount,
  Path(id): Path<Uuid>,
  Json(body): Json<LinkBody>,
) -> Result<Json<Account>, ApiError> {
  auth.require_admin()?;
  let account = store
    .link_account(id, body.employee_id.map(EmployeeId))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(account))
}
