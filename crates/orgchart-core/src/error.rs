//! Error types for `orgchart-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{employee::EmployeeId, policy::Action, role::Role};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("invalid role: {0:?}")]
  InvalidRole(String),

  #[error("employee {0} cannot be their own manager")]
  SelfManagement(EmployeeId),

  #[error("manager not found: {0}")]
  ManagerNotFound(EmployeeId),

  #[error("a {manager} cannot manage a {subordinate}")]
  RankViolation { manager: Role, subordinate: Role },

  #[error("a CEO cannot have a manager")]
  CeoMustHaveNoManager,

  #[error(
    "employee {id} has {} subordinate(s); reassign them first",
    .subordinates.len()
  )]
  HasSubordinates {
    id:           EmployeeId,
    subordinates: Vec<EmployeeId>,
  },

  #[error("insufficient permission to {action} a {target}")]
  InsufficientPermission { action: Action, target: Role },

  #[error("employee {0} is already CEO and cannot be promoted further")]
  CannotPromoteFurther(EmployeeId),

  #[error("employee not found: {0}")]
  EmployeeNotFound(EmployeeId),

  #[error("employee number already exists: {0}")]
  DuplicateEmployeeNumber(String),

  #[error("email already exists: {0}")]
  DuplicateEmail(String),

  #[error("account not found: {0}")]
  AccountNotFound(Uuid),

  #[error("an account with email {0} already exists")]
  EmailTaken(String),

  #[error("employee {0} is already linked to another account")]
  EmployeeAlreadyLinked(EmployeeId),

  #[error("{0}")]
  Validation(String),
}

impl Error {
  /// Stable machine-readable name of the violation.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::InvalidRole(_) => "invalid_role",
      Self::SelfManagement(_) => "self_management",
      Self::ManagerNotFound(_) => "manager_not_found",
      Self::RankViolation { .. } => "rank_violation",
      Self::CeoMustHaveNoManager => "ceo_must_have_no_manager",
      Self::HasSubordinates { .. } => "has_subordinates",
      Self::InsufficientPermission { .. } => "insufficient_permission",
      Self::CannotPromoteFurther(_) => "cannot_promote_further",
      Self::EmployeeNotFound(_) => "employee_not_found",
      Self::DuplicateEmployeeNumber(_) => "duplicate_employee_number",
      Self::DuplicateEmail(_) => "duplicate_email",
      Self::AccountNotFound(_) => "account_not_found",
      Self::EmailTaken(_) => "email_taken",
      Self::EmployeeAlreadyLinked(_) => "employee_already_linked",
      Self::Validation(_) => "validation",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
