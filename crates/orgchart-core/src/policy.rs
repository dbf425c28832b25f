//! Authorization rules: who may create, edit, delete or promote whom.
//!
//! Every decision compares ranks from [`crate::role`]. A caller whose account
//! has no employee record carries no rank; such a caller may create any role
//! below CEO and is denied everything else.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  employee::EmployeeId,
  role::{Rank, Role},
};

// ─── Caller ──────────────────────────────────────────────────────────────────

/// The identity behind a mutation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
  /// An account linked to an employee; decisions use that employee's rank.
  Employee { id: EmployeeId, role: Role },
  /// An account with no employee record (e.g. a system administrator).
  Unaffiliated,
}

impl Caller {
  pub fn rank(&self) -> Option<Rank> {
    match self {
      Self::Employee { role, .. } => Some(role.rank()),
      Self::Unaffiliated => None,
    }
  }
}

/// The mutation being authorized; carried by
/// [`Error::InsufficientPermission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  Create,
  Update,
  Delete,
  Promote,
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Create => "create",
      Self::Update => "update",
      Self::Delete => "delete",
      Self::Promote => "promote",
    })
  }
}

// ─── Predicates ──────────────────────────────────────────────────────────────

/// The caller may only create roles strictly below their own authority.
pub fn can_create(caller: &Caller, target: Role) -> bool {
  match caller.rank() {
    Some(rank) => rank.outranks(target.rank()),
    None => target != Role::Ceo,
  }
}

/// Strict authority ordering; peers never manage each other.
pub fn can_manage(manager: Rank, subordinate: Rank) -> bool {
  manager.outranks(subordinate)
}

pub fn can_delete(caller: &Caller, target: Rank) -> bool {
  caller.rank().is_some_and(|rank| rank.outranks(target))
}

/// Editing an existing employee requires the same strict outranking as
/// deleting one.
pub fn can_update(caller: &Caller, target: Rank) -> bool {
  can_delete(caller, target)
}

/// The promoted employee may reach, but not exceed, the caller's rank.
pub fn can_promote(caller: &Caller, resulting: Rank) -> bool {
  caller.rank().is_some_and(|rank| resulting >= rank)
}

/// The roles `caller` may create, highest authority first.
pub fn creatable_roles(caller: &Caller) -> Vec<Role> {
  Role::all().filter(|r| can_create(caller, *r)).collect()
}

// ─── Guards ──────────────────────────────────────────────────────────────────

fn deny(action: Action, target: Role) -> Error {
  Error::InsufficientPermission { action, target }
}

pub fn authorize_create(caller: &Caller, target: Role) -> Result<()> {
  if can_create(caller, target) {
    Ok(())
  } else {
    Err(deny(Action::Create, target))
  }
}

/// `current` is the target's role before the edit; `new_role` is the role
/// the edit assigns, if it changes it.
pub fn authorize_update(
  caller: &Caller,
  current: Role,
  new_role: Option<Role>,
) -> Result<()> {
  if !can_update(caller, current.rank()) {
    return Err(deny(Action::Update, current));
  }
  match new_role {
    Some(role) if role != current && !can_create(caller, role) => {
      Err(deny(Action::Update, role))
    }
    _ => Ok(()),
  }
}

pub fn authorize_delete(caller: &Caller, target: Role) -> Result<()> {
  if can_delete(caller, target.rank()) {
    Ok(())
  } else {
    Err(deny(Action::Delete, target))
  }
}
