//! Employee records and the inputs that create or modify them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Store-assigned numeric identity of an employee.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Employee ────────────────────────────────────────────────────────────────

/// A persisted employee. Subordinates are derived: every employee whose
/// `manager_id` equals this `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
  pub id:              EmployeeId,
  /// Human-facing identifier, unique across the organization.
  pub employee_number: String,
  pub name:            String,
  pub surname:         String,
  pub role:            Role,
  pub department:      Option<String>,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub birth_date:      Option<NaiveDate>,
  /// Whole currency units.
  pub salary:          Option<i64>,
  pub manager_id:      Option<EmployeeId>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Employee {
  pub fn full_name(&self) -> String { format!("{} {}", self.name, self.surname) }

  pub fn summary(&self) -> EmployeeSummary {
    EmployeeSummary {
      id:              self.id,
      employee_number: self.employee_number.clone(),
      name:            self.name.clone(),
      surname:         self.surname.clone(),
      role:            self.role,
      department:      self.department.clone(),
    }
  }
}

/// The short form of an employee used in manager, subordinate and option
/// lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
  pub id:              EmployeeId,
  pub employee_number: String,
  pub name:            String,
  pub surname:         String,
  pub role:            Role,
  pub department:      Option<String>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::EmployeeStore::create_employee`].
/// `id`, `created_at` and `updated_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEmployee {
  pub employee_number: String,
  pub name:            String,
  pub surname:         String,
  pub role:            Role,
  pub department:      Option<String>,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub birth_date:      Option<NaiveDate>,
  pub salary:          Option<i64>,
  pub manager_id:      Option<EmployeeId>,
}

impl NewEmployee {
  /// Convenience constructor with every optional field unset.
  pub fn new(
    employee_number: impl Into<String>,
    name: impl Into<String>,
    surname: impl Into<String>,
    role: Role,
  ) -> Self {
    Self {
      employee_number: employee_number.into(),
      name: name.into(),
      surname: surname.into(),
      role,
      department: None,
      email: None,
      phone_number: None,
      birth_date: None,
      salary: None,
      manager_id: None,
    }
  }

  pub fn reporting_to(mut self, manager_id: EmployeeId) -> Self {
    self.manager_id = Some(manager_id);
    self
  }

  pub fn in_department(mut self, department: impl Into<String>) -> Self {
    self.department = Some(department.into());
    self
  }
}

/// What an update does with the manager reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerChange {
  /// Leave the current manager in place.
  #[default]
  Keep,
  /// Remove the manager reference.
  Clear,
  Set(EmployeeId),
}

/// Partial update for [`crate::store::EmployeeStore::update_employee`].
/// `None` fields are left untouched. Optional columns are cleared with
/// `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdate {
  pub employee_number: Option<String>,
  pub name:            Option<String>,
  pub surname:         Option<String>,
  pub role:            Option<Role>,
  pub department:      Option<Option<String>>,
  pub email:           Option<Option<String>>,
  pub phone_number:    Option<Option<String>>,
  pub birth_date:      Option<Option<NaiveDate>>,
  pub salary:          Option<Option<i64>>,
  pub manager:         ManagerChange,
}

impl EmployeeUpdate {
  /// Apply the non-hierarchy fields to `employee` in place. Role and manager
  /// are resolved separately by the consistency checker.
  pub fn apply_details(&self, employee: &mut Employee) {
    if let Some(v) = &self.employee_number {
      employee.employee_number = v.clone();
    }
    if let Some(v) = &self.name {
      employee.name = v.clone();
    }
    if let Some(v) = &self.surname {
      employee.surname = v.clone();
    }
    if let Some(v) = &self.department {
      employee.department = v.clone();
    }
    if let Some(v) = &self.email {
      employee.email = v.clone();
    }
    if let Some(v) = &self.phone_number {
      employee.phone_number = v.clone();
    }
    if let Some(v) = self.birth_date {
      employee.birth_date = v;
    }
    if let Some(v) = self.salary {
      employee.salary = v;
    }
  }
}
