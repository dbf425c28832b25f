//! Org chart materialisation.
//!
//! The adjacency list (each employee's `manager_id`) is indexed once into a
//! parent → children map, then walked depth-first with an explicit stack.
//! Roots are the employees without a manager. Siblings are ordered by rank,
//! then name, so authority reads top to bottom and the output is stable.
//!
//! A visited set bounds the walk even if the stored data contains a cycle;
//! anything not reachable from a root is returned in
//! [`OrgChart::detached`].

use std::{
  cmp::Ordering,
  collections::{HashMap, HashSet},
};

use serde::Serialize;

use crate::employee::{Employee, EmployeeId};

/// One employee and everyone reporting to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgNode<T = Employee> {
  #[serde(flatten)]
  pub item:     T,
  pub children: Vec<OrgNode<T>>,
}

impl<T> OrgNode<T> {
  /// Number of nodes in this subtree, including `self`.
  pub fn size(&self) -> usize {
    let mut total = 0;
    let mut pending = vec![self];
    while let Some(node) = pending.pop() {
      total += 1;
      pending.extend(node.children.iter());
    }
    total
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgChart<T = Employee> {
  pub roots:    Vec<OrgNode<T>>,
  /// Employees unreachable from any root. Empty for well-formed data.
  pub detached: Vec<EmployeeId>,
}

/// Deterministic, authority-first sibling order.
fn sibling_order(a: &Employee, b: &Employee) -> Ordering {
  a.role
    .rank()
    .cmp(&b.role.rank())
    .then_with(|| a.name.cmp(&b.name))
    .then_with(|| a.surname.cmp(&b.surname))
    .then_with(|| a.id.cmp(&b.id))
}

struct Frame<T> {
  idx:   usize,
  next:  usize,
  built: Vec<OrgNode<T>>,
}

impl<T> Frame<T> {
  fn new(idx: usize) -> Self { Self { idx, next: 0, built: Vec::new() } }
}

pub fn build(employees: &[Employee]) -> OrgChart {
  build_with(employees, Employee::clone)
}

/// Build the chart, mapping each employee to a node payload with `f`.
pub fn build_with<T, F>(employees: &[Employee], mut f: F) -> OrgChart<T>
where
  F: FnMut(&Employee) -> T,
{
  let mut children: HashMap<Option<EmployeeId>, Vec<usize>> = HashMap::new();
  for (idx, employee) in employees.iter().enumerate() {
    children.entry(employee.manager_id).or_default().push(idx);
  }
  for siblings in children.values_mut() {
    siblings.sort_by(|&a, &b| sibling_order(&employees[a], &employees[b]));
  }

  let mut visited: HashSet<EmployeeId> = HashSet::new();
  let mut roots = Vec::new();
  let top = children.get(&None).cloned().unwrap_or_default();

  for root in top {
    if !visited.insert(employees[root].id) {
      continue;
    }
    let mut stack = vec![Frame::new(root)];

    loop {
      let Some(frame) = stack.last_mut() else { break };
      let id = employees[frame.idx].id;
      let next_child = children
        .get(&Some(id))
        .and_then(|kids| kids.get(frame.next))
        .copied();
      frame.next += 1;

      match next_child {
        Some(child) => {
          if visited.insert(employees[child].id) {
            stack.push(Frame::new(child));
          }
        }
        None => {
          let Some(done) = stack.pop() else { break };
          let node = OrgNode {
            item:     f(&employees[done.idx]),
            children: done.built,
          };
          match stack.last_mut() {
            Some(parent) => parent.built.push(node),
            None => roots.push(node),
          }
        }
      }
    }
  }

  let mut detached: Vec<EmployeeId> = employees
    .iter()
    .map(|e| e.id)
    .filter(|id| !visited.contains(id))
    .collect();
  detached.sort();
  detached.dedup();

  OrgChart { roots, detached }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::role::Role;

  fn employee(id: i64, name: &str, role: Role, manager: Option<i64>) -> Employee {
    let now = Utc::now();
    Employee {
      id:              EmployeeId(id),
      employee_number: format!("E{id}"),
      name:            name.into(),
      surname:         "Doe".into(),
      role,
      department:      None,
      email:           None,
      phone_number:    None,
      birth_date:      None,
      salary:          None,
      manager_id:      manager.map(EmployeeId),
      created_at:      now,
      updated_at:      now,
    }
  }

  fn sample() -> Vec<Employee> {
    vec![
      employee(4, "Zoe", Role::JuniorEmployee, Some(3)),
      employee(1, "Ada", Role::Ceo, None),
      employee(3, "Max", Role::Manager, Some(2)),
      employee(2, "Dan", Role::Director, Some(1)),
      employee(5, "Bea", Role::Manager, Some(2)),
      employee(6, "Cal", Role::SeniorManager, Some(2)),
    ]
  }

  fn ids<T>(nodes: &[OrgNode<T>], id_of: impl Fn(&T) -> EmployeeId) -> Vec<EmployeeId> {
    nodes.iter().map(|n| id_of(&n.item)).collect()
  }

  #[test]
  fn single_root_with_nested_children() {
    let chart = build(&sample());
    assert_eq!(chart.roots.len(), 1);
    assert!(chart.detached.is_empty());

    let ceo = &chart.roots[0];
    assert_eq!(ceo.item.id, EmployeeId(1));
    assert_eq!(ceo.size(), 6);

    let director = &ceo.children[0];
    assert_eq!(director.item.id, EmployeeId(2));
    // SENIOR_MANAGER first, then the two MANAGERs by name.
    assert_eq!(
      ids(&director.children, |e| e.id),
      vec![EmployeeId(6), EmployeeId(5), EmployeeId(3)]
    );
    assert_eq!(director.children[2].children[0].item.id, EmployeeId(4));
  }

  #[test]
  fn building_twice_is_identical() {
    let data = sample();
    assert_eq!(build(&data), build(&data));

    let mut shuffled = data.clone();
    shuffled.reverse();
    assert_eq!(build(&data), build(&shuffled));
  }

  #[test]
  fn unrooted_cycle_is_detached_not_followed() {
    let mut data = sample();
    data.push(employee(7, "Eve", Role::Intern, Some(8)));
    data.push(employee(8, "Fay", Role::Intern, Some(7)));

    let chart = build(&data);
    assert_eq!(chart.roots[0].size(), 6);
    assert_eq!(chart.detached, vec![EmployeeId(7), EmployeeId(8)]);
  }

  #[test]
  fn empty_input_gives_empty_chart() {
    let chart = build(&[]);
    assert!(chart.roots.is_empty());
    assert!(chart.detached.is_empty());
  }

  #[test]
  fn build_with_maps_payloads() {
    let chart = build_with(&sample(), |e| e.full_name());
    assert_eq!(chart.roots[0].item, "Ada Doe");
    assert_eq!(chart.roots[0].children[0].item, "Dan Doe");
  }
}
