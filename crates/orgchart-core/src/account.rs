//! Accounts: the login identities, distinct from employee records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::employee::EmployeeId;

/// Coarse system-access role, independent of the organizational
/// [`Role`](crate::role::Role).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountRole {
  Admin,
  #[default]
  Viewer,
}

impl AccountRole {
  /// Viewers may read but never mutate.
  pub fn can_write(self) -> bool { matches!(self, Self::Admin) }
}

/// A login identity, optionally linked 1:1 to an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
  pub account_id:  Uuid,
  pub email:       String,
  pub name:        String,
  pub role:        AccountRole,
  pub employee_id: Option<EmployeeId>,
  pub created_at:  DateTime<Utc>,
}

/// An account together with its stored password hash. Never serialised.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub account:       Account,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Input to [`crate::store::AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub role:          AccountRole,
  pub employee_id:   Option<EmployeeId>,
}
