//! [`AccountStore`] for [`SqliteStore`], plus first-run bootstrap.

use orgchart_core::{
  account::{Account, AccountRole, Credentials, NewAccount},
  employee::{Employee, EmployeeId, EmployeeSummary, NewEmployee},
  role::Role,
  store::AccountStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    ACCOUNT_COLUMNS, EMPLOYEE_COLUMNS, RawAccount, RawEmployee,
    encode_account_role, encode_dt, encode_role, encode_uuid, now,
    role_rank_sql,
  },
  store::{SqliteStore, create_checked, fetch_employee},
};

fn fetch_account(conn: &rusqlite::Connection, id: Uuid) -> Result<Option<Account>> {
  let raw = conn
    .query_row(
      &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawAccount::from_row,
    )
    .optional()?;
  raw.map(RawAccount::into_account).transpose()
}

/// The account currently linked to `employee`, if any.
fn linked_account(
  conn: &rusqlite::Connection,
  employee: EmployeeId,
) -> Result<Option<Uuid>> {
  let raw: Option<String> = conn
    .query_row(
      "SELECT account_id FROM accounts WHERE employee_id = ?1",
      rusqlite::params![employee.0],
      |r| r.get(0),
    )
    .optional()?;
  Ok(raw.as_deref().map(Uuid::parse_str).transpose()?)
}

fn insert_account(conn: &rusqlite::Connection, input: NewAccount) -> Result<Account> {
  let email_taken: bool = conn.query_row(
    "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?1 COLLATE NOCASE)",
    rusqlite::params![input.email],
    |r| r.get(0),
  )?;
  if email_taken {
    return Err(orgchart_core::Error::EmailTaken(input.email).into());
  }

  if let Some(employee) = input.employee_id {
    if fetch_employee(conn, employee)?.is_none() {
      return Err(orgchart_core::Error::EmployeeNotFound(employee).into());
    }
    if linked_account(conn, employee)?.is_some() {
      return Err(orgchart_core::Error::EmployeeAlreadyLinked(employee).into());
    }
  }

  let account = Account {
    account_id:  Uuid::new_v4(),
    email:       input.email,
    name:        input.name,
    role:        input.role,
    employee_id: input.employee_id,
    created_at:  now(),
  };

  conn.execute(
    "INSERT INTO accounts
       (account_id, email, name, password_hash, role, employee_id, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(account.account_id),
      account.email,
      account.name,
      input.password_hash,
      encode_account_role(account.role),
      account.employee_id.map(|e| e.0),
      encode_dt(account.created_at),
    ],
  )?;

  Ok(account)
}

impl SqliteStore {
  /// Create the chief executive and an admin account linked to them.
  ///
  /// This is the only way a CEO enters an empty directory: no caller
  /// outranks a CEO, so ordinary creation can never produce one. The
  /// hierarchy checks still apply. Fails if a CEO already exists.
  pub async fn bootstrap(
    &self,
    account: NewAccount,
    ceo: NewEmployee,
  ) -> Result<(Account, Employee)> {
    self
      .transact(move |tx| {
        if ceo.role != Role::Ceo {
          return Err(
            orgchart_core::Error::Validation("bootstrap employee must be the CEO".into())
              .into(),
          );
        }
        let ceo_exists: bool = tx.query_row(
          "SELECT EXISTS(SELECT 1 FROM employees WHERE role = ?1)",
          rusqlite::params![encode_role(Role::Ceo)],
          |r| r.get(0),
        )?;
        if ceo_exists {
          return Err(
            orgchart_core::Error::Validation("a CEO already exists".into()).into(),
          );
        }

        let employee = create_checked(tx, ceo)?;
        let account = insert_account(tx, NewAccount {
          role: AccountRole::Admin,
          employee_id: Some(employee.id),
          ..account
        })?;
        Ok((account, employee))
      })
      .await
  }
}

impl AccountStore for SqliteStore {
  type Error = crate::Error;

  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    self.transact(move |tx| insert_account(tx, input)).await
  }

  async fn register_account(&self, input: NewAccount) -> Result<Account> {
    self
      .transact(move |tx| {
        let existing: i64 =
          tx.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?;
        let role = match existing {
          0 => AccountRole::Admin,
          _ => AccountRole::Viewer,
        };
        insert_account(tx, NewAccount { role, employee_id: None, ..input })
      })
      .await
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    self.transact(move |tx| fetch_account(tx, id)).await
  }

  async fn credentials(&self, email: &str) -> Result<Option<Credentials>> {
    let email = email.to_owned();
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1 COLLATE NOCASE"
            ),
            rusqlite::params![email],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|raw| {
        let (account, password_hash) = raw.into_parts()?;
        Ok(Credentials { account, password_hash })
      })
      .transpose()
  }

  async fn count_accounts(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  async fn link_account(
    &self,
    account_id: Uuid,
    employee_id: Option<EmployeeId>,
  ) -> Result<Account> {
    self
      .transact(move |tx| {
        let mut account = fetch_account(tx, account_id)?
          .ok_or(orgchart_core::Error::AccountNotFound(account_id))?;

        if let Some(employee) = employee_id {
          if fetch_employee(tx, employee)?.is_none() {
            return Err(orgchart_core::Error::EmployeeNotFound(employee).into());
          }
          match linked_account(tx, employee)? {
            Some(other) if other != account_id => {
              return Err(orgchart_core::Error::EmployeeAlreadyLinked(employee).into());
            }
            _ => {}
          }
        }

        tx.execute(
          "UPDATE accounts SET employee_id = ?2 WHERE account_id = ?1",
          rusqlite::params![encode_uuid(account_id), employee_id.map(|e| e.0)],
        )?;
        account.employee_id = employee_id;
        Ok(account)
      })
      .await
  }

  async fn unlinked_employees(&self) -> Result<Vec<EmployeeSummary>> {
    let sql = format!(
      "SELECT {EMPLOYEE_COLUMNS} FROM employees
       WHERE employee_id NOT IN
         (SELECT employee_id FROM accounts WHERE employee_id IS NOT NULL)
       ORDER BY {}, name, surname, employee_id",
      role_rank_sql("role"),
    );

    let raws: Vec<RawEmployee> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmployee::into_summary).collect()
  }
}
