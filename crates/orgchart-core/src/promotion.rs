//! Promotion: one step up the fixed role chain, gated by the caller's rank.
//!
//! `INTERN → JUNIOR_EMPLOYEE → … → CTO → CEO`. CEO is terminal; there is no
//! demotion.

use crate::{
  Error, Result,
  employee::EmployeeId,
  policy::{Action, Caller, can_promote},
  role::Role,
};

/// The role `employee` would hold after promotion by `caller`.
pub fn promote(caller: &Caller, employee: EmployeeId, current: Role) -> Result<Role> {
  let next = current
    .promoted()
    .ok_or(Error::CannotPromoteFurther(employee))?;

  if !can_promote(caller, next.rank()) {
    return Err(Error::InsufficientPermission {
      action: Action::Promote,
      target: next,
    });
  }
  Ok(next)
}

#[cfg(test)]
mod tests {
  use super::*;

  const DIRECTOR: Caller =
    Caller::Employee { id: EmployeeId(1), role: Role::Director };

  #[test]
  fn promotion_moves_exactly_one_step() {
    for role in Role::all().filter(|r| *r != Role::Ceo) {
      let caller = Caller::Employee { id: EmployeeId(1), role: Role::Ceo };
      let next = promote(&caller, EmployeeId(2), role).unwrap();
      assert_eq!(next.rank().get() + 1, role.rank().get());
    }
  }

  #[test]
  fn ceo_cannot_be_promoted() {
    let caller = Caller::Employee { id: EmployeeId(1), role: Role::Ceo };
    assert_eq!(
      promote(&caller, EmployeeId(1), Role::Ceo),
      Err(Error::CannotPromoteFurther(EmployeeId(1)))
    );
  }

  #[test]
  fn caller_may_promote_up_to_their_own_rank() {
    assert_eq!(
      promote(&DIRECTOR, EmployeeId(5), Role::SeniorManager),
      Ok(Role::Director)
    );
    assert_eq!(
      promote(&DIRECTOR, EmployeeId(5), Role::Director),
      Err(Error::InsufficientPermission {
        action: Action::Promote,
        target: Role::Cto,
      })
    );
  }

  #[test]
  fn unaffiliated_caller_cannot_promote() {
    assert!(matches!(
      promote(&Caller::Unaffiliated, EmployeeId(5), Role::Intern),
      Err(Error::InsufficientPermission { .. })
    ));
  }
}
