//! The `EmployeeStore` and `AccountStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `orgchart-store-sqlite`). Higher layers (`orgchart-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  account::{Account, Credentials, NewAccount},
  employee::{Employee, EmployeeId, EmployeeSummary, EmployeeUpdate, NewEmployee},
  policy::Caller,
  role::Role,
};

// ─── Query types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
  #[default]
  EmployeeNumber,
  Name,
  Surname,
  /// Authority order, CEO first when ascending.
  Role,
  Department,
  CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

/// Parameters for [`EmployeeStore::list_employees`].
#[derive(Debug, Clone)]
pub struct EmployeeQuery {
  /// Case-insensitive substring match over name, surname, employee number,
  /// email and department.
  pub search:     Option<String>,
  pub role:       Option<Role>,
  /// Case-insensitive substring match on department.
  pub department: Option<String>,
  pub manager_id: Option<EmployeeId>,
  pub sort:       SortField,
  pub direction:  SortDirection,
  /// 1-based.
  pub page:       u32,
  pub limit:      u32,
}

impl EmployeeQuery {
  pub const DEFAULT_LIMIT: u32 = 50;

  pub fn offset(&self) -> u64 {
    u64::from(self.page.max(1) - 1) * u64::from(self.limit)
  }
}

impl Default for EmployeeQuery {
  fn default() -> Self {
    Self {
      search:     None,
      role:       None,
      department: None,
      manager_id: None,
      sort:       SortField::default(),
      direction:  SortDirection::default(),
      page:       1,
      limit:      Self::DEFAULT_LIMIT,
    }
  }
}

/// One page of [`EmployeeStore::list_employees`] results.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeePage {
  pub employees:   Vec<Employee>,
  pub total:       u64,
  pub page:        u32,
  pub limit:       u32,
  pub total_pages: u64,
}

impl EmployeePage {
  pub fn new(employees: Vec<Employee>, total: u64, query: &EmployeeQuery) -> Self {
    let total_pages = match query.limit {
      0 => 0,
      limit => total.div_ceil(u64::from(limit)),
    };
    Self { employees, total, page: query.page.max(1), limit: query.limit, total_pages }
  }
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ManagerLoad {
  pub manager:            EmployeeSummary,
  pub subordinates_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hire {
  pub employee:   EmployeeSummary,
  pub hired_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
  pub total_employees:   u64,
  pub departments_count: u64,
  /// Managerial employees with the most direct reports, at most three.
  pub top_managers:      Vec<ManagerLoad>,
  /// The most recently created employees, at most five.
  pub latest_hires:      Vec<Hire>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Implemented by backend error types so callers can separate rule violations
/// from infrastructure failures.
pub trait StoreError: std::error::Error + Send + Sync + Sized + 'static {
  /// Return the domain error this failure represents, or give `self` back if
  /// it is an infrastructure failure.
  fn into_domain(self) -> Result<crate::Error, Self>;
}

// ─── Employees ───────────────────────────────────────────────────────────────

/// Abstraction over an employee directory backend.
///
/// Every mutating method authorizes `caller`, runs the hierarchy consistency
/// checks and writes the change as one atomic unit: either all checks pass
/// and the write commits, or nothing changes.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EmployeeStore: Send + Sync {
  type Error: StoreError;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve an employee by id. Returns `None` if not found.
  fn get_employee(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn list_employees<'a>(
    &'a self,
    query: &'a EmployeeQuery,
  ) -> impl Future<Output = Result<EmployeePage, Self::Error>> + Send + 'a;

  /// Every employee, unordered. Input to the org chart builder.
  fn all_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  /// Direct reports of `id`.
  fn subordinates(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  fn count_subordinates(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Distinct non-empty departments, sorted.
  fn departments(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Employees holding a managerial role, by rank then name.
  fn potential_managers(
    &self,
    exclude: Option<EmployeeId>,
  ) -> impl Future<Output = Result<Vec<EmployeeSummary>, Self::Error>> + Send + '_;

  fn dashboard_stats(
    &self,
  ) -> impl Future<Output = Result<DashboardStats, Self::Error>> + Send + '_;

  // ── Checked mutations ─────────────────────────────────────────────────

  fn create_employee(
    &self,
    caller: Caller,
    input: NewEmployee,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn update_employee(
    &self,
    caller: Caller,
    id: EmployeeId,
    update: EmployeeUpdate,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  /// Move `id` one role up the chain.
  fn promote_employee(
    &self,
    caller: Caller,
    id: EmployeeId,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  /// Fails with `HasSubordinates` while anyone still reports to `id`.
  fn delete_employee(
    &self,
    caller: Caller,
    id: EmployeeId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

pub trait AccountStore: Send + Sync {
  type Error: StoreError;

  /// Returns `EmailTaken` if the email is in use, and `EmployeeAlreadyLinked`
  /// if `input.employee_id` already belongs to an account.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Create a self-registered account. The role is decided together with
  /// the insert: `Admin` while no account exists, `Viewer` afterwards.
  /// `input.role` is ignored.
  fn register_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Look up an account and its password hash by email.
  fn credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  fn count_accounts(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Link `account_id` to `employee_id`, replacing any previous link, or
  /// unlink it when `employee_id` is `None`.
  fn link_account(
    &self,
    account_id: Uuid,
    employee_id: Option<EmployeeId>,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Employees that no account is linked to.
  fn unlinked_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<EmployeeSummary>, Self::Error>> + Send + '_;
}
