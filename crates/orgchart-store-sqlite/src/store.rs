//! [`SqliteStore`]: the SQLite implementation of [`EmployeeStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, types::Value};
use orgchart_core::{
  employee::{Employee, EmployeeId, EmployeeSummary, EmployeeUpdate, ManagerChange, NewEmployee},
  hierarchy::{Placement, check_deletion, check_subordinates},
  policy::{self, Caller},
  promotion,
  role::Role,
  store::{
    DashboardStats, EmployeePage, EmployeeQuery, EmployeeStore, Hire, ManagerLoad,
    SortDirection, SortField,
  },
};

use crate::{
  encode::{
    EMPLOYEE_COLUMNS, RawEmployee, decode_role, encode_date, encode_dt,
    encode_role, managerial_roles_sql, now, role_rank_sql,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An employee directory backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. All access
/// is serialised through the connection's worker thread, and every checked
/// mutation runs in its own transaction.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `body` inside a transaction. The transaction commits only if
  /// `body` succeeds; on any error it is rolled back when dropped.
  pub(crate) async fn transact<T, F>(&self, body: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = body(&tx);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

pub(crate) fn fetch_employee(
  conn: &rusqlite::Connection,
  id: EmployeeId,
) -> Result<Option<Employee>> {
  let raw = conn
    .query_row(
      &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1"),
      rusqlite::params![id.0],
      RawEmployee::from_row,
    )
    .optional()?;
  raw.map(RawEmployee::into_employee).transpose()
}

fn fetch_role(conn: &rusqlite::Connection, id: EmployeeId) -> Result<Option<Role>> {
  let raw: Option<String> = conn
    .query_row(
      "SELECT role FROM employees WHERE employee_id = ?1",
      rusqlite::params![id.0],
      |r| r.get(0),
    )
    .optional()?;
  raw.as_deref().map(decode_role).transpose()
}

fn fetch_subordinates(
  conn: &rusqlite::Connection,
  id: EmployeeId,
) -> Result<Vec<Employee>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE manager_id = ?1
     ORDER BY {}, name, surname, employee_id",
    role_rank_sql("role"),
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![id.0], RawEmployee::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawEmployee::into_employee).collect()
}

fn fetch_many(
  conn: &rusqlite::Connection,
  sql: &str,
  params: &[Value],
) -> Result<Vec<Employee>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(rusqlite::params_from_iter(params.iter()), RawEmployee::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawEmployee::into_employee).collect()
}

/// Whether `column = value` is held by an employee other than `except`.
fn value_taken(
  conn: &rusqlite::Connection,
  column: &'static str,
  value: &str,
  except: Option<EmployeeId>,
) -> Result<bool> {
  let found: Option<i64> = conn
    .query_row(
      &format!(
        "SELECT employee_id FROM employees
         WHERE {column} = ?1 AND (?2 IS NULL OR employee_id != ?2)"
      ),
      rusqlite::params![value, except.map(|e| e.0)],
      |r| r.get(0),
    )
    .optional()?;
  Ok(found.is_some())
}

fn ensure_unique(
  conn: &rusqlite::Connection,
  employee_number: &str,
  email: Option<&str>,
  except: Option<EmployeeId>,
) -> Result<()> {
  if value_taken(conn, "employee_number", employee_number, except)? {
    return Err(
      orgchart_core::Error::DuplicateEmployeeNumber(employee_number.to_owned()).into(),
    );
  }
  if let Some(email) = email {
    if value_taken(conn, "email", email, except)? {
      return Err(orgchart_core::Error::DuplicateEmail(email.to_owned()).into());
    }
  }
  Ok(())
}

/// A `LIKE ... ESCAPE '\'` pattern matching `text` literally anywhere.
fn contains_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

/// The caller as of this transaction. A linked employee's role is re-read so
/// decisions never use a rank that changed after authentication; a caller
/// whose employee record is gone carries no rank.
fn current_caller(conn: &rusqlite::Connection, caller: Caller) -> Result<Caller> {
  match caller {
    Caller::Employee { id, .. } => Ok(match fetch_role(conn, id)? {
      Some(role) => Caller::Employee { id, role },
      None => Caller::Unaffiliated,
    }),
    Caller::Unaffiliated => Ok(Caller::Unaffiliated),
  }
}

fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(orgchart_core::Error::Validation(format!("{field} is required")).into());
  }
  Ok(())
}

/// Resolve the placement's manager role and run the consistency checks.
fn place(conn: &rusqlite::Connection, placement: &Placement) -> Result<Option<EmployeeId>> {
  let manager_role = match placement.manager {
    Some(manager) => fetch_role(conn, manager)?,
    None => None,
  };
  Ok(placement.check(manager_role)?)
}

pub(crate) fn insert_employee(
  conn: &rusqlite::Connection,
  input: NewEmployee,
  manager_id: Option<EmployeeId>,
) -> Result<Employee> {
  let now = now();
  conn.execute(
    "INSERT INTO employees (
       employee_number, name, surname, role, department, email,
       phone_number, birth_date, salary, manager_id, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    rusqlite::params![
      input.employee_number,
      input.name,
      input.surname,
      encode_role(input.role),
      input.department,
      input.email,
      input.phone_number,
      input.birth_date.map(encode_date),
      input.salary,
      manager_id.map(|m| m.0),
      encode_dt(now),
      encode_dt(now),
    ],
  )?;

  Ok(Employee {
    id: EmployeeId(conn.last_insert_rowid()),
    employee_number: input.employee_number,
    name: input.name,
    surname: input.surname,
    role: input.role,
    department: input.department,
    email: input.email,
    phone_number: input.phone_number,
    birth_date: input.birth_date,
    salary: input.salary,
    manager_id,
    created_at: now,
    updated_at: now,
  })
}

fn write_employee(conn: &rusqlite::Connection, e: &Employee) -> Result<()> {
  conn.execute(
    "UPDATE employees SET
       employee_number = ?2, name = ?3, surname = ?4, role = ?5,
       department = ?6, email = ?7, phone_number = ?8, birth_date = ?9,
       salary = ?10, manager_id = ?11, updated_at = ?12
     WHERE employee_id = ?1",
    rusqlite::params![
      e.id.0,
      e.employee_number,
      e.name,
      e.surname,
      encode_role(e.role),
      e.department,
      e.email,
      e.phone_number,
      e.birth_date.map(encode_date),
      e.salary,
      e.manager_id.map(|m| m.0),
      encode_dt(e.updated_at),
    ],
  )?;
  Ok(())
}

/// Checked creation. Shared with the admin bootstrap, which skips only the
/// authorization step.
pub(crate) fn create_checked(
  conn: &rusqlite::Connection,
  input: NewEmployee,
) -> Result<Employee> {
  require_text("employee number", &input.employee_number)?;
  require_text("name", &input.name)?;
  require_text("surname", &input.surname)?;
  ensure_unique(conn, &input.employee_number, input.email.as_deref(), None)?;

  let manager_id = place(conn, &Placement::for_new(&input))?;
  insert_employee(conn, input, manager_id)
}

// ─── EmployeeStore impl ──────────────────────────────────────────────────────

impl EmployeeStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>> {
    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1"),
            rusqlite::params![id.0],
            RawEmployee::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_employees(&self, query: &EmployeeQuery) -> Result<EmployeePage> {
    let query = query.clone();

    self
      .transact(move |tx| {
        // Build WHERE clause dynamically; parameters are pushed in the same
        // order as their placeholders.
        let mut conds: Vec<&'static str> = vec![];
        let mut params: Vec<Value> = vec![];

        if let Some(text) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
          conds.push(
            "(name LIKE ? ESCAPE '\\' OR surname LIKE ? ESCAPE '\\'
              OR employee_number LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\'
              OR department LIKE ? ESCAPE '\\')",
          );
          let pattern = contains_pattern(text.trim());
          params.extend(std::iter::repeat_n(Value::Text(pattern), 5));
        }
        if let Some(role) = query.role {
          conds.push("role = ?");
          params.push(Value::Text(encode_role(role).to_owned()));
        }
        if let Some(dept) = query.department.as_deref().filter(|d| !d.is_empty()) {
          conds.push("department LIKE ? ESCAPE '\\'");
          params.push(Value::Text(contains_pattern(dept)));
        }
        if let Some(manager) = query.manager_id {
          conds.push("manager_id = ?");
          params.push(Value::Integer(manager.0));
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let total: i64 = tx.query_row(
          &format!("SELECT COUNT(*) FROM employees {where_clause}"),
          rusqlite::params_from_iter(params.iter()),
          |r| r.get(0),
        )?;

        let sort_expr = match query.sort {
          SortField::EmployeeNumber => "employee_number".to_owned(),
          SortField::Name => "name".to_owned(),
          SortField::Surname => "surname".to_owned(),
          SortField::Role => role_rank_sql("role"),
          SortField::Department => "department".to_owned(),
          SortField::CreatedAt => "created_at".to_owned(),
        };
        let direction = match query.direction {
          SortDirection::Asc => "ASC",
          SortDirection::Desc => "DESC",
        };

        let sql = format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees {where_clause}
           ORDER BY {sort_expr} {direction}, employee_id ASC
           LIMIT ? OFFSET ?"
        );
        params.push(Value::Integer(i64::from(query.limit)));
        params.push(Value::Integer(i64::try_from(query.offset()).unwrap_or(i64::MAX)));

        let employees = fetch_many(tx, &sql, &params)?;
        Ok(EmployeePage::new(employees, total.max(0) as u64, &query))
      })
      .await
  }

  async fn all_employees(&self) -> Result<Vec<Employee>> {
    self
      .transact(|tx| {
        fetch_many(tx, &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees"), &[])
      })
      .await
  }

  async fn subordinates(&self, id: EmployeeId) -> Result<Vec<Employee>> {
    self.transact(move |tx| fetch_subordinates(tx, id)).await
  }

  async fn count_subordinates(&self, id: EmployeeId) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM employees WHERE manager_id = ?1",
          rusqlite::params![id.0],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  async fn departments(&self) -> Result<Vec<String>> {
    let departments = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT department FROM employees
           WHERE department IS NOT NULL AND department != ''
           ORDER BY department ASC",
        )?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(departments)
  }

  async fn potential_managers(
    &self,
    exclude: Option<EmployeeId>,
  ) -> Result<Vec<EmployeeSummary>> {
    let sql = format!(
      "SELECT {EMPLOYEE_COLUMNS} FROM employees
       WHERE role IN {} AND (?1 IS NULL OR employee_id != ?1)
       ORDER BY {}, name, surname, employee_id",
      managerial_roles_sql(),
      role_rank_sql("role"),
    );

    let raws: Vec<RawEmployee> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![exclude.map(|e| e.0)], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmployee::into_summary).collect()
  }

  async fn dashboard_stats(&self) -> Result<DashboardStats> {
    self
      .transact(|tx| {
        let total: i64 =
          tx.query_row("SELECT COUNT(*) FROM employees", [], |r| r.get(0))?;
        let departments: i64 = tx.query_row(
          "SELECT COUNT(DISTINCT department) FROM employees
           WHERE department IS NOT NULL AND department != ''",
          [],
          |r| r.get(0),
        )?;

        let loads: Vec<(i64, i64)> = {
          let mut stmt = tx.prepare(&format!(
            "SELECT e.employee_id, COUNT(s.employee_id) AS n
             FROM employees e
             LEFT JOIN employees s ON s.manager_id = e.employee_id
             WHERE e.role IN {}
             GROUP BY e.employee_id
             ORDER BY n DESC, e.employee_id ASC
             LIMIT 3",
            managerial_roles_sql(),
          ))?;
          stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut top_managers = Vec::with_capacity(loads.len());
        for (id, count) in loads {
          if let Some(manager) = fetch_employee(tx, EmployeeId(id))? {
            top_managers.push(ManagerLoad {
              manager:            manager.summary(),
              subordinates_count: count.max(0) as u64,
            });
          }
        }

        let latest_hires = fetch_many(
          tx,
          &format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees
             ORDER BY created_at DESC, employee_id DESC LIMIT 5"
          ),
          &[],
        )?
        .into_iter()
        .map(|e| Hire { hired_date: e.created_at, employee: e.summary() })
        .collect();

        Ok(DashboardStats {
          total_employees: total.max(0) as u64,
          departments_count: departments.max(0) as u64,
          top_managers,
          latest_hires,
        })
      })
      .await
  }

  // ── Checked mutations ─────────────────────────────────────────────────────

  async fn create_employee(&self, caller: Caller, input: NewEmployee) -> Result<Employee> {
    self
      .transact(move |tx| {
        let caller = current_caller(tx, caller)?;
        policy::authorize_create(&caller, input.role)?;
        create_checked(tx, input)
      })
      .await
  }

  async fn update_employee(
    &self,
    caller: Caller,
    id: EmployeeId,
    update: EmployeeUpdate,
  ) -> Result<Employee> {
    self
      .transact(move |tx| {
        let caller = current_caller(tx, caller)?;
        let mut employee = fetch_employee(tx, id)?
          .ok_or(orgchart_core::Error::EmployeeNotFound(id))?;
        policy::authorize_update(&caller, employee.role, update.role)?;

        if let Some(number) = &update.employee_number {
          require_text("employee number", number)?;
        }
        if let Some(name) = &update.name {
          require_text("name", name)?;
        }
        if let Some(surname) = &update.surname {
          require_text("surname", surname)?;
        }

        let role = update.role.unwrap_or(employee.role);
        let manager_id = place(tx, &Placement::for_update(&employee, role, update.manager))?;
        if role != employee.role {
          check_subordinates(role, &fetch_subordinates(tx, id)?)?;
        }

        update.apply_details(&mut employee);
        ensure_unique(tx, &employee.employee_number, employee.email.as_deref(), Some(id))?;
        employee.role = role;
        employee.manager_id = manager_id;
        employee.updated_at = now();

        write_employee(tx, &employee)?;
        Ok(employee)
      })
      .await
  }

  async fn promote_employee(&self, caller: Caller, id: EmployeeId) -> Result<Employee> {
    self
      .transact(move |tx| {
        let caller = current_caller(tx, caller)?;
        let mut employee = fetch_employee(tx, id)?
          .ok_or(orgchart_core::Error::EmployeeNotFound(id))?;
        let next = promotion::promote(&caller, id, employee.role)?;

        // Rising to the manager's own rank is a rank violation; rising to
        // CEO drops the manager.
        let manager_id =
          place(tx, &Placement::for_update(&employee, next, ManagerChange::Keep))?;

        employee.role = next;
        employee.manager_id = manager_id;
        employee.updated_at = now();
        write_employee(tx, &employee)?;
        Ok(employee)
      })
      .await
  }

  async fn delete_employee(&self, caller: Caller, id: EmployeeId) -> Result<()> {
    self
      .transact(move |tx| {
        let caller = current_caller(tx, caller)?;
        let employee = fetch_employee(tx, id)?
          .ok_or(orgchart_core::Error::EmployeeNotFound(id))?;
        policy::authorize_delete(&caller, employee.role)?;

        let subordinates: Vec<EmployeeId> = fetch_subordinates(tx, id)?
          .into_iter()
          .map(|s| s.id)
          .collect();
        check_deletion(id, &subordinates)?;

        tx.execute(
          "DELETE FROM employees WHERE employee_id = ?1",
          rusqlite::params![id.0],
        )?;
        Ok(())
      })
      .await
  }
}
