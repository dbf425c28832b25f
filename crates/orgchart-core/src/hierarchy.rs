//! Consistency checks on the manager/subordinate relation.
//!
//! The checks are pure: the store reads whatever they need (the proposed
//! manager's role, the subject's subordinates) inside the same transaction
//! that later writes the mutation, and aborts the transaction on the first
//! violation.
//!
//! Invariants upheld after every successful write:
//! - nobody manages themselves;
//! - a manager reference resolves and strictly outranks the subordinate;
//! - a CEO has no manager.
//!
//! Strictly decreasing rank toward the root also rules out cycles.

use crate::{
  Error, Result,
  employee::{Employee, EmployeeId, ManagerChange, NewEmployee},
  policy::can_manage,
  role::Role,
};

/// A proposed position of an employee in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
  /// `None` while the employee is being created.
  pub subject:  Option<EmployeeId>,
  pub role:     Role,
  pub manager:  Option<EmployeeId>,
  /// Whether the caller supplied `manager` in this request, as opposed to it
  /// being carried over from the stored record.
  pub explicit: bool,
}

impl Placement {
  pub fn for_new(input: &NewEmployee) -> Self {
    Self {
      subject:  None,
      role:     input.role,
      manager:  input.manager_id,
      explicit: input.manager_id.is_some(),
    }
  }

  pub fn for_update(current: &Employee, role: Role, change: ManagerChange) -> Self {
    let (manager, explicit) = match change {
      ManagerChange::Keep => (current.manager_id, false),
      ManagerChange::Clear => (None, true),
      ManagerChange::Set(id) => (Some(id), true),
    };
    Self { subject: Some(current.id), role, manager, explicit }
  }

  /// Validate the placement and return the manager reference to persist.
  ///
  /// `manager_role` is the stored role of `self.manager`, or `None` when that
  /// id does not resolve.
  ///
  /// A CEO inherits no manager: a carried-over reference is dropped, while
  /// one supplied in the request is rejected.
  ///
  /// Order: self-reference, CEO root, manager existence, rank. No manager
  /// outranks a CEO, so the CEO rule must run before the rank comparison to
  /// report `CeoMustHaveNoManager` at all.
  pub fn check(&self, manager_role: Option<Role>) -> Result<Option<EmployeeId>> {
    if let (Some(subject), Some(manager)) = (self.subject, self.manager)
      && subject == manager
    {
      return Err(Error::SelfManagement(subject));
    }

    if self.role == Role::Ceo {
      return match self.manager {
        Some(_) if self.explicit => Err(Error::CeoMustHaveNoManager),
        _ => Ok(None),
      };
    }

    let Some(manager) = self.manager else {
      return Ok(None);
    };
    let manager_role = manager_role.ok_or(Error::ManagerNotFound(manager))?;

    if !can_manage(manager_role.rank(), self.role.rank()) {
      return Err(Error::RankViolation {
        manager:     manager_role,
        subordinate: self.role,
      });
    }
    Ok(Some(manager))
  }
}

/// After a role change, every existing subordinate must still be strictly
/// outranked by the new role.
pub fn check_subordinates(role: Role, subordinates: &[Employee]) -> Result<()> {
  match subordinates
    .iter()
    .find(|s| !can_manage(role.rank(), s.role.rank()))
  {
    Some(blocking) => Err(Error::RankViolation {
      manager:     role,
      subordinate: blocking.role,
    }),
    None => Ok(()),
  }
}

/// An employee can only be deleted once nobody reports to them.
pub fn check_deletion(id: EmployeeId, subordinates: &[EmployeeId]) -> Result<()> {
  if subordinates.is_empty() {
    Ok(())
  } else {
    Err(Error::HasSubordinates { id, subordinates: subordinates.to_vec() })
  }
}
