//! HTTP Basic authentication against stored accounts.
//!
//! Every request carries `Authorization: Basic base64(email:password)`. The
//! password is checked against the account's argon2 hash, and the account's
//! linked employee (if any) becomes the [`Caller`] for authorization.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use orgchart_core::{
  account::Account,
  employee::Employee,
  policy::Caller,
};
use rand_core::OsRng;

use crate::{Directory, error::ApiError};

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash `password` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Whether `password` matches the stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

/// Reject passwords that are too short to be stored.
pub fn check_password_strength(password: &str) -> Result<(), ApiError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(
      orgchart_core::Error::Validation(format!(
        "password must be at least {MIN_PASSWORD_LEN} characters"
      ))
      .into(),
    );
  }
  Ok(())
}

/// Decode `email:password` from a Basic `Authorization` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

/// Look up `email` and verify `password`. Unknown accounts and wrong
/// passwords are indistinguishable to the client.
pub async fn authenticate<S: Directory>(
  store: &S,
  email: &str,
  password: &str,
) -> Result<Account, ApiError> {
  let creds = store
    .credentials(email)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(password, &creds.password_hash) {
    tracing::debug!(email, "password rejected");
    return Err(ApiError::Unauthorized);
  }
  Ok(creds.account)
}

/// The authenticated account behind a request, with its linked employee.
#[derive(Debug, Clone)]
pub struct CurrentAccount {
  pub account:  Account,
  pub employee: Option<Employee>,
}

impl CurrentAccount {
  /// The identity used for rank-based authorization.
  pub fn caller(&self) -> Caller {
    match &self.employee {
      Some(e) => Caller::Employee { id: e.id, role: e.role },
      None => Caller::Unaffiliated,
    }
  }

  /// The caller, provided the account may mutate the directory at all.
  pub fn writer(&self) -> Result<Caller, ApiError> {
    if !self.account.role.can_write() {
      return Err(ApiError::Forbidden("viewer accounts are read-only".into()));
    }
    Ok(self.caller())
  }

  /// Fail unless the account is an administrator.
  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.account.role.can_write() {
      Ok(())
    } else {
      Err(ApiError::Forbidden("administrator access required".into()))
    }
  }
}

impl<S: Directory> FromRequestParts<Arc<S>> for CurrentAccount {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;
    let account = authenticate(store.as_ref(), &email, &password).await?;

    let employee = match account.employee_id {
      Some(id) => store.get_employee(id).await.map_err(ApiError::store)?,
      None => None,
    };
    Ok(Self { account, employee })
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("hunter22").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter22", &hash));
    assert!(!verify_password("hunter23", &hash));
    assert!(!verify_password("hunter22", "not a phc string"));
  }

  #[test]
  fn decodes_basic_header() {
    let value = format!("Basic {}", B64.encode("ada@example.com:pa:ss"));
    let (email, password) = basic_credentials(&headers_with(&value)).unwrap();
    assert_eq!(email, "ada@example.com");
    assert_eq!(password, "pa:ss");
  }

  #[test]
  fn rejects_malformed_headers() {
    assert!(matches!(basic_credentials(&HeaderMap::new()), Err(ApiError::Unauthorized)));
    assert!(matches!(
      basic_credentials(&headers_with("Bearer abc")),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      basic_credentials(&headers_with("Basic !!!")),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn short_passwords_are_rejected() {
    assert!(check_password_strength("12345").is_err());
    assert!(check_password_strength("123456").is_ok());
  }
}
