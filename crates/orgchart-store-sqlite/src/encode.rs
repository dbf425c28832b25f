//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that they
//! sort lexically. Dates are `YYYY-MM-DD`. Roles are their wire names.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use orgchart_core::{
  account::{Account, AccountRole},
  employee::{Employee, EmployeeId, EmployeeSummary},
  role::Role,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

/// The current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Roles ───────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

pub fn encode_account_role(r: AccountRole) -> &'static str {
  match r {
    AccountRole::Admin => "ADMIN",
    AccountRole::Viewer => "VIEWER",
  }
}

pub fn decode_account_role(s: &str) -> Result<AccountRole> {
  match s {
    "ADMIN" => Ok(AccountRole::Admin),
    "VIEWER" => Ok(AccountRole::Viewer),
    other => Err(Error::Decode(format!("unknown account role: {other:?}"))),
  }
}

/// `CASE` expression mapping the `role` column to its rank, for ordering.
pub fn role_rank_sql(column: &str) -> String {
  let arms: String = Role::all()
    .map(|r| format!(" WHEN '{}' THEN {}", r.as_str(), r.rank()))
    .collect();
  format!("(CASE {column}{arms} END)")
}

/// SQL list literal of the managerial roles, e.g. `('CEO', 'CTO', …)`.
pub fn managerial_roles_sql() -> String {
  let names: Vec<String> = Role::all()
    .filter(|r| r.is_managerial())
    .map(|r| format!("'{}'", r.as_str()))
    .collect();
  format!("({})", names.join(", "))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawEmployee::from_row`].
pub const EMPLOYEE_COLUMNS: &str = "employee_id, employee_number, name, \
  surname, role, department, email, phone_number, birth_date, salary, \
  manager_id, created_at, updated_at";

/// Raw values read directly from an `employees` row.
pub struct RawEmployee {
  pub employee_id:     i64,
  pub employee_number: String,
  pub name:            String,
  pub surname:         String,
  pub role:            String,
  pub department:      Option<String>,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub birth_date:      Option<String>,
  pub salary:          Option<i64>,
  pub manager_id:      Option<i64>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawEmployee {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id:     row.get(0)?,
      employee_number: row.get(1)?,
      name:            row.get(2)?,
      surname:         row.get(3)?,
      role:            row.get(4)?,
      department:      row.get(5)?,
      email:           row.get(6)?,
      phone_number:    row.get(7)?,
      birth_date:      row.get(8)?,
      salary:          row.get(9)?,
      manager_id:      row.get(10)?,
      created_at:      row.get(11)?,
      updated_at:      row.get(12)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      id:              EmployeeId(self.employee_id),
      employee_number: self.employee_number,
      name:            self.name,
      surname:         self.surname,
      role:            decode_role(&self.role)?,
      department:      self.department,
      email:           self.email,
      phone_number:    self.phone_number,
      birth_date:      self.birth_date.as_deref().map(decode_date).transpose()?,
      salary:          self.salary,
      manager_id:      self.manager_id.map(EmployeeId),
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }

  pub fn into_summary(self) -> Result<EmployeeSummary> {
    Ok(EmployeeSummary {
      id:              EmployeeId(self.employee_id),
      employee_number: self.employee_number,
      name:            self.name,
      surname:         self.surname,
      role:            decode_role(&self.role)?,
      department:      self.department,
    })
  }
}

/// Column list matching [`RawAccount::from_row`].
pub const ACCOUNT_COLUMNS: &str =
  "account_id, email, name, role, employee_id, created_at, password_hash";

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub name:          String,
  pub role:          String,
  pub employee_id:   Option<i64>,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      email:         row.get(1)?,
      name:          row.get(2)?,
      role:          row.get(3)?,
      employee_id:   row.get(4)?,
      created_at:    row.get(5)?,
      password_hash: row.get(6)?,
    })
  }

  /// Decode the account, returning the password hash alongside it.
  pub fn into_parts(self) -> Result<(Account, String)> {
    let account = Account {
      account_id:  decode_uuid(&self.account_id)?,
      email:       self.email,
      name:        self.name,
      role:        decode_account_role(&self.role)?,
      employee_id: self.employee_id.map(EmployeeId),
      created_at:  decode_dt(&self.created_at)?,
    };
    Ok((account, self.password_hash))
  }

  pub fn into_account(self) -> Result<Account> {
    self.into_parts().map(|(account, _)| account)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_round_trip_and_sort_lexically() {
    let early = decode_dt("2024-01-01T00:00:00Z").unwrap();
    let late = decode_dt("2024-01-01T00:00:00.5Z").unwrap();
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn rank_case_covers_every_role() {
    let sql = role_rank_sql("role");
    assert!(sql.starts_with("(CASE role WHEN 'CEO' THEN 1"));
    assert!(sql.ends_with("WHEN 'INTERN' THEN 9 END)"));
  }

  #[test]
  fn unknown_role_in_column_is_a_core_error() {
    assert!(matches!(
      decode_role("JANITOR"),
      Err(Error::Core(orgchart_core::Error::InvalidRole(_)))
    ));
  }
}
