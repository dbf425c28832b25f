//! Handlers for `/employees` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/employees` | search, filter, sort, paginate |
//! | `POST`   | `/employees` | 201; caller must outrank the new role |
//! | `GET`    | `/employees/hierarchy` | org chart forest |
//! | `GET`    | `/employees/departments` | distinct, sorted |
//! | `GET`    | `/employees/potential-managers` | optional `?exclude_id=` |
//! | `GET`    | `/employees/available-roles` | roles the caller may create |
//! | `GET`    | `/employees/available-for-accounts` | admin; no account linked |
//! | `GET`    | `/employees/dashboard-stats` | |
//! | `GET`    | `/employees/:id` | with manager and direct reports |
//! | `PUT`    | `/employees/:id` | partial update |
//! | `POST`   | `/employees/:id/promote` | one step up |
//! | `DELETE` | `/employees/:id` | 204; 409 while anyone reports to them |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use orgchart_core::{
  employee::{Employee, EmployeeId, EmployeeSummary, EmployeeUpdate, ManagerChange, NewEmployee},
  policy,
  role::Role,
  store::{DashboardStats, EmployeeQuery, SortDirection, SortField},
  tree::{self, OrgChart},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Directory, auth::CurrentAccount, avatar::gravatar_url, error::ApiError};

/// Upper bound on `?limit=`.
pub const MAX_PAGE_SIZE: u32 = 200;

// ─── Response shapes ─────────────────────────────────────────────────────────

/// An employee as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
  #[serde(flatten)]
  pub employee:   Employee,
  pub avatar_url: Option<String>,
}

impl From<Employee> for EmployeeView {
  fn from(employee: Employee) -> Self {
    let avatar_url = employee.email.as_deref().map(gravatar_url);
    Self { employee, avatar_url }
  }
}

#[derive(Debug, Serialize)]
pub struct EmployeeDetail {
  #[serde(flatten)]
  pub view:         EmployeeView,
  pub manager:      Option<EmployeeSummary>,
  pub subordinates: Vec<EmployeeSummary>,
}

#[derive(Debug, Serialize)]
pub struct PageView {
  pub employees:   Vec<EmployeeView>,
  pub total:       u64,
  pub page:        u32,
  pub limit:       u32,
  pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct RoleOption {
  pub role: Role,
  pub rank: u8,
}

// ─── Role parsing ────────────────────────────────────────────────────────────

/// Roles arrive as free text so unknown names surface as `invalid_role`
/// rather than a generic body rejection.
fn parse_role(raw: &str) -> Result<Role, ApiError> { Ok(raw.parse()?) }

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub search:     Option<String>,
  pub role:       Option<String>,
  pub department: Option<String>,
  pub manager_id: Option<i64>,
  pub sort:       Option<SortField>,
  pub order:      Option<SortDirection>,
  pub page:       Option<u32>,
  pub limit:      Option<u32>,
}

impl ListParams {
  fn into_query(self) -> Result<EmployeeQuery, ApiError> {
    Ok(EmployeeQuery {
      search:     self.search,
      role:       self.role.as_deref().map(parse_role).transpose()?,
      department: self.department,
      manager_id: self.manager_id.map(EmployeeId),
      sort:       self.sort.unwrap_or_default(),
      direction:  self.order.unwrap_or_default(),
      page:       self.page.unwrap_or(1).max(1),
      limit:      self
        .limit
        .unwrap_or(EmployeeQuery::DEFAULT_LIMIT)
        .clamp(1, MAX_PAGE_SIZE),
    })
  }
}

/// `GET /employees`
pub async fn list<S: Directory>(
  State(store): State<Arc<S>>,
  _auth: CurrentAccount,
  Query(params): Query<ListParams>,
) -> Result<Json<PageView>, ApiError> {
  let query = params.into_query()?;
  let page = store.list_employees(&query).await.map_err(ApiError::store)?;
  Ok(Json(PageView {
    employees:   page.employees.into_iter().map(EmployeeView::from).collect(),
    total:       page.total,
    page:        page.page,
    limit:       page.limit,
    total_pages: page.total_pages,
  }))
}

// ─── Read-only collections ───────────────────────────────────────────────────

/// `GET /employees/hierarchy`
pub async fn hierarchy<S: Directory>(
  State(store): State<Arc<S>>,
  _auth: CurrentAccount,
) -> Result<Json<OrgChart<EmployeeView>>, ApiError> {
  let employees = store.all_employees().await.map_err(ApiError::store)?;
  let chart = tree::build_with(&employees, |e| EmployeeView::from(e.clone()));
  if !chart.detached.is_empty() {
    tracing::warn!(detached = ?chart.detached, "employees unreachable from any root");
  }
  Ok(Json(chart))
}

/// `GET /employees/departments`
pub async fn departments<S: Directory>(
  State(store): State<Arc<S>>,
  _auth: CurrentAccount,
) -> Result<Json<Vec<String>>, ApiError> {
  Ok(Json(store.departments().await.map_err(ApiError::store)?))
}

#[derive(Debug, Deserialize)]
pub struct ManagerParams {
  pub exclude_id: Option<i64>,
}

/// `GET /employees/potential-managers[?exclude_id=<id>]`
pub async fn potential_managers<S: Directory>(
  State(store): State<Arc<S>>,
  _auth: CurrentAccount,
  Query(params): Query<ManagerParams>,
) -> Result<Json<Vec<EmployeeSummary>>, ApiError> {
  let managers = store
    .potential_managers(params.exclude_id.map(EmployeeId))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(managers))
}

/// `GET /employees/available-roles`
///
/// Viewers get an empty list since they cannot create anyone.
pub async fn available_roles(auth: CurrentAccount) -> Json<Vec<RoleOption>> {
  let roles = match auth.writer() {
    Ok(caller) => policy::creatable_roles(&caller),
    Err(_) => vec![],
  };
  Json(
    roles
      .into_iter()
      .map(|role| RoleOption { role, rank: role.rank().get() })
      .collect(),
  )
}

/// `GET /employees/available-for-accounts`
pub async fn available_for_accounts<S: Directory>(
  State(store): State<Arc<S>>,
  auth: CurrentAccount,
) -> Result<Json<Vec<EmployeeSummary>>, ApiError> {
  auth.require_admin()?;
  Ok(Json(store.unlinked_employees().await.map_err(ApiError::store)?))
}

/// `GET /employees/dashboard-stats`
pub async fn dashboard_stats<S: Directory>(
  State(store): State<Arc<S>>,
  _auth: CurrentAccount,
) -> Result<Json<DashboardStats>, ApiError> {
  Ok(Json(store.dashboard_stats().await.map_err(ApiError::store)?))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /employees/:id`
pub async fn get_one<S: Directory>(
  State(store): State<Arc<S>>,
  _auth: CurrentAccount,
  Path(id): Path<i64>,
) -> Result<Json<EmployeeDetail>, ApiError> {
  let id = EmployeeId(id);
  let employee = store
    .get_employee(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("employee {id} not found")))?;

  let manager = match employee.manager_id {
    Some(m) => store
      .get_employee(m)
      .await
      .map_err(ApiError::store)?
      .map(|m| m.summary()),
    None => None,
  };
  let subordinates = store
    .subordinates(id)
    .await
    .map_err(ApiError::store)?
    .iter()
    .map(Employee::summary)
    .collect();

  Ok(Json(EmployeeDetail { view: employee.into(), manager, subordinates }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub employee_number: String,
  pub name:            String,
  pub surname:         String,
  pub role:            String,
  pub department:      Option<String>,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub birth_date:      Option<NaiveDate>,
  pub salary:          Option<i64>,
  pub manager_id:      Option<i64>,
}

/// `POST /employees`
pub async fn create<S: Directory>(
  State(store): State<Arc<S>>,
  auth: CurrentAccount,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let caller = auth.writer()?;
  let input = NewEmployee {
    employee_number: body.employee_number.trim().to_owned(),
    name:            body.name.trim().to_owned(),
    surname:         body.surname.trim().to_owned(),
    role:            parse_role(&body.role)?,
    department:      non_blank(body.department),
    email:           non_blank(body.email),
    phone_number:    non_blank(body.phone_number),
    birth_date:      body.birth_date,
    salary:          body.salary,
    manager_id:      body.manager_id.map(EmployeeId),
  };

  let employee = store
    .create_employee(caller, input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(id = %employee.id, role = %employee.role, "employee created");
  Ok((StatusCode::CREATED, Json(EmployeeView::from(employee))))
}

fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  pub employee_number: Option<String>,
  pub name:            Option<String>,
  pub surname:         Option<String>,
  pub role:            Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub department:      Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub email:           Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub phone_number:    Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub birth_date:      Option<Option<NaiveDate>>,
  #[serde(default, deserialize_with = "double_option")]
  pub salary:          Option<Option<i64>>,
  #[serde(default, deserialize_with = "double_option")]
  pub manager_id:      Option<Option<i64>>,
}

impl UpdateBody {
  fn into_update(self) -> Result<EmployeeUpdate, ApiError> {
    let manager = match self.manager_id {
      None => ManagerChange::Keep,
      Some(None) => ManagerChange::Clear,
      Some(Some(id)) => ManagerChange::Set(EmployeeId(id)),
    };
    Ok(EmployeeUpdate {
      employee_number: self.employee_number.map(|v| v.trim().to_owned()),
      name: self.name.map(|v| v.trim().to_owned()),
      surname: self.surname.map(|v| v.trim().to_owned()),
      role: self.role.as_deref().map(parse_role).transpose()?,
      department: self.department.map(non_blank),
      email: self.email.map(non_blank),
      phone_number: self.phone_number.map(non_blank),
      birth_date: self.birth_date,
      salary: self.salary,
      manager,
    })
  }
}

/// `PUT /employees/:id`
pub async fn update<S: Directory>(
  State(store): State<Arc<S>>,
  auth: CurrentAccount,
  Path(id): Path<i64>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<EmployeeView>, ApiError> {
  let caller = auth.writer()?;
  let employee = store
    .update_employee(caller, EmployeeId(id), body.into_update()?)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(id = %employee.id, "employee updated");
  Ok(Json(employee.into()))
}

// ─── Promote ─────────────────────────────────────────────────────────────────

/// `POST /employees/:id/promote`
pub async fn promote<S: Directory>(
  State(store): State<Arc<S>>,
  auth: CurrentAccount,
  Path(id): Path<i64>,
) -> Result<Json<EmployeeView>, ApiError> {
  let caller = auth.writer()?;
  let employee = store
    .promote_employee(caller, EmployeeId(id))
    .await
    .map_err(ApiError::store)?;
  tracing::info!(id = %employee.id, role = %employee.role, "employee promoted");
  Ok(Json(employee.into()))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /employees/:id`
pub async fn delete_one<S: Directory>(
  State(store): State<Arc<S>>,
  auth: CurrentAccount,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
  let caller = auth.writer()?;
  store
    .delete_employee(caller, EmployeeId(id))
    .await
    .map_err(ApiError::store)?;
  tracing::info!(id, "employee deleted");
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn update_body_distinguishes_null_from_absent() {
    let body: UpdateBody =
      serde_json::from_str(r#"{"manager_id": null, "department": "Ops"}"#).unwrap();
    let update = body.into_update().unwrap();
    assert_eq!(update.manager, ManagerChange::Clear);
    assert_eq!(update.department, Some(Some("Ops".into())));
    assert_eq!(update.email, None);

    let body: UpdateBody = serde_json::from_str("{}").unwrap();
    assert_eq!(body.into_update().unwrap().manager, ManagerChange::Keep);
  }

  #[test]
  fn unknown_role_is_invalid_role() {
    let params = ListParams { role: Some("JANITOR".into()), ..Default::default() };
    assert!(matches!(
      params.into_query(),
      Err(ApiError::Domain(orgchart_core::Error::InvalidRole(_)))
    ));
  }

  #[test]
  fn page_size_is_clamped() {
    let params = ListParams { limit: Some(10_000), page: Some(0), ..Default::default() };
    let query = params.into_query().unwrap();
    assert_eq!(query.limit, MAX_PAGE_SIZE);
    assert_eq!(query.page, 1);
  }
}
