//! Organizational roles and the rank table that orders them.
//!
//! Rank 1 is the highest authority (CEO), rank 9 the lowest (INTERN). The
//! table is a `const fn` match, so there is no global state to initialise.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator as _, IntoStaticStr};

use crate::{Error, Result};

// ─── Rank ────────────────────────────────────────────────────────────────────

/// Integer encoding of organizational authority. Lower is higher authority.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct Rank(u8);

impl Rank {
  pub const HIGHEST: Rank = Rank(1);
  pub const LOWEST: Rank = Rank(9);

  pub const fn get(self) -> u8 { self.0 }

  /// Whether `self` carries strictly more authority than `other`.
  pub const fn outranks(self, other: Rank) -> bool { self.0 < other.0 }
}

impl fmt::Display for Rank {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

/// The closed set of organizational roles, declared highest authority first.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Ceo,
  Cto,
  Director,
  SeniorManager,
  Manager,
  TeamLead,
  SeniorEmployee,
  JuniorEmployee,
  Intern,
}

impl Role {
  pub const fn rank(self) -> Rank {
    Rank(match self {
      Self::Ceo => 1,
      Self::Cto => 2,
      Self::Director => 3,
      Self::SeniorManager => 4,
      Self::Manager => 5,
      Self::TeamLead => 6,
      Self::SeniorEmployee => 7,
      Self::JuniorEmployee => 8,
      Self::Intern => 9,
    })
  }

  pub const fn from_rank(rank: Rank) -> Option<Self> {
    match rank.0 {
      1 => Some(Self::Ceo),
      2 => Some(Self::Cto),
      3 => Some(Self::Director),
      4 => Some(Self::SeniorManager),
      5 => Some(Self::Manager),
      6 => Some(Self::TeamLead),
      7 => Some(Self::SeniorEmployee),
      8 => Some(Self::JuniorEmployee),
      9 => Some(Self::Intern),
      _ => None,
    }
  }

  /// The role one step closer to CEO, or `None` for the CEO itself.
  pub const fn promoted(self) -> Option<Self> {
    match self.rank().0 {
      1 => None,
      r => Self::from_rank(Rank(r - 1)),
    }
  }

  /// Roles that may appear as someone's manager (CEO down to TEAM_LEAD).
  pub const fn is_managerial(self) -> bool { self.rank().0 <= 6 }

  /// The wire name, e.g. `"SENIOR_MANAGER"`.
  pub fn as_str(self) -> &'static str { self.into() }

  /// All roles, highest authority first.
  pub fn all() -> impl Iterator<Item = Role> { Self::iter() }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::iter()
      .find(|r| r.as_str() == s)
      .ok_or_else(|| Error::InvalidRole(s.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn ranks_are_unique_and_cover_one_to_nine() {
    let ranks: HashSet<u8> = Role::all().map(|r| r.rank().get()).collect();
    assert_eq!(ranks.len(), 9);
    assert_eq!(ranks, (1..=9).collect());
    assert_eq!(Role::Ceo.rank(), Rank::HIGHEST);
    assert_eq!(Role::Intern.rank(), Rank::LOWEST);
  }

  #[test]
  fn from_rank_inverts_rank() {
    for role in Role::all() {
      assert_eq!(Role::from_rank(role.rank()), Some(role));
    }
    assert_eq!(Role::from_rank(Rank(0)), None);
    assert_eq!(Role::from_rank(Rank(10)), None);
  }

  #[test]
  fn promoted_walks_one_step_toward_ceo() {
    assert_eq!(Role::JuniorEmployee.promoted(), Some(Role::SeniorEmployee));
    assert_eq!(Role::Cto.promoted(), Some(Role::Ceo));
    assert_eq!(Role::Ceo.promoted(), None);
  }

  #[test]
  fn parse_and_display_use_screaming_snake_case() {
    let role: Role = "SENIOR_MANAGER".parse().unwrap();
    assert_eq!(role, Role::SeniorManager);
    assert_eq!(role.to_string(), "SENIOR_MANAGER");
    assert_eq!(
      serde_json::to_string(&Role::TeamLead).unwrap(),
      "\"TEAM_LEAD\""
    );
  }

  #[test]
  fn unknown_role_is_rejected() {
    let err = "JANITOR".parse::<Role>().unwrap_err();
    assert!(matches!(err, Error::InvalidRole(ref s) if s == "JANITOR"));
  }

  #[test]
  fn managerial_roles_stop_at_team_lead() {
    let managerial: Vec<Role> =
      Role::all().filter(|r| r.is_managerial()).collect();
    assert_eq!(managerial.len(), 6);
    assert!(!Role::SeniorEmployee.is_managerial());
  }
}
