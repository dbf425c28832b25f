//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use orgchart_core::{
  account::{AccountRole, NewAccount},
  employee::{Employee, NewEmployee},
  role::Role,
};
use orgchart_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{api_router, auth::hash_password};

const CEO: (&str, &str) = ("ceo@example.com", "secret1");

async fn app_with_ceo() -> (Router, Employee) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let (_, ceo) = store
    .bootstrap(
      NewAccount {
        email:         CEO.0.into(),
        name:          "Ada Chief".into(),
        password_hash: hash_password(CEO.1).unwrap(),
        role:          AccountRole::Admin,
        employee_id:   None,
      },
      NewEmployee::new("E-001", "Ada", "Chief", Role::Ceo),
    )
    .await
    .unwrap();
  (api_router(Arc::new(store)), ceo)
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  creds: Option<(&str, &str)>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some((user, pass)) = creds {
    builder = builder.header(
      header::AUTHORIZATION,
      format!("Basic {}", B64.encode(format!("{user}:{pass}"))),
    );
  }
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn employee_body(number: &str, name: &str, role: &str, manager: Option<i64>) -> Value {
  json!({
    "employee_number": number,
    "name": name,
    "surname": "Test",
    "role": role,
    "manager_id": manager,
  })
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credentials_return_401_with_challenge() {
  let (app, _) = app_with_ceo().await;
  let res = app
    .clone()
    .oneshot(Request::builder().uri("/employees").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));

  let (status, body) =
    send(&app, "GET", "/employees", Some((CEO.0, "wrong-password")), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn first_registration_is_admin_and_later_ones_are_viewers() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let app = api_router(Arc::new(store));

  let (status, first) = send(&app, "POST", "/auth/register", None, Some(json!({
    "email": "first@example.com", "name": "First", "password": "secret1"
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(first["role"], "ADMIN");

  let (_, second) = send(&app, "POST", "/auth/register", None, Some(json!({
    "email": "second@example.com", "name": "Second", "password": "secret2"
  })))
  .await;
  assert_eq!(second["role"], "VIEWER");

  let (status, body) = send(&app, "POST", "/auth/register", None, Some(json!({
    "email": "Second@Example.com", "name": "Again", "password": "secret3"
  })))
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["kind"], "email_taken");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_promote_one_admin() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let app = api_router(Arc::new(store));

  let tasks: Vec<_> = (0..4)
    .map(|i| {
      let app = app.clone();
      tokio::spawn(async move {
        send(&app, "POST", "/auth/register", None, Some(json!({
          "email": format!("user{i}@example.com"), "name": "User", "password": "secret1"
        })))
        .await
      })
    })
    .collect();

  let mut admins = 0;
  for task in tasks {
    let (status, body) = task.await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    if body["role"] == "ADMIN" {
      admins += 1;
    }
  }
  assert_eq!(admins, 1);
}

#[tokio::test]
async fn short_password_is_rejected() {
  let (app, _) = app_with_ceo().await;
  let (status, body) = send(&app, "POST", "/auth/register", None, Some(json!({
    "email": "x@example.com", "name": "X", "password": "12345"
  })))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn login_and_me_report_linked_employee() {
  let (app, ceo) = app_with_ceo().await;

  let (status, body) = send(&app, "POST", "/auth/login", None, Some(json!({
    "email": CEO.0, "password": CEO.1
  })))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["employee"]["id"], ceo.id.0);

  let (status, _) = send(&app, "POST", "/auth/login", None, Some(json!({
    "email": CEO.0, "password": "nope-nope"
  })))
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, me) = send(&app, "GET", "/auth/me", Some(CEO), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["role"], "ADMIN");
  assert_eq!(me["employee"]["role"], "CEO");
}

// ─── Employees ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_read_and_list() {
  let (app, ceo) = app_with_ceo().await;

  let mut body = employee_body("E-002", "Grace", "CTO", Some(ceo.id.0));
  body["email"] = json!("grace@example.com");
  let (status, cto) = send(&app, "POST", "/employees", Some(CEO), Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(cto["role"], "CTO");
  assert!(cto["avatar_url"].as_str().unwrap().starts_with("https://www.gravatar.com/avatar/"));

  let uri = format!("/employees/{}", cto["id"]);
  let (status, detail) = send(&app, "GET", &uri, Some(CEO), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(detail["manager"]["id"], ceo.id.0);
  assert_eq!(detail["subordinates"], json!([]));

  let (_, page) = send(&app, "GET", "/employees?sort=role&limit=1", Some(CEO), None).await;
  assert_eq!(page["total"], 2);
  assert_eq!(page["total_pages"], 2);
  assert_eq!(page["employees"][0]["role"], "CEO");
}

#[tokio::test]
async fn invalid_role_and_rank_violation_are_bad_requests() {
  let (app, ceo) = app_with_ceo().await;

  let (status, body) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-002", "Jan", "JANITOR", Some(ceo.id.0))),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "invalid_role");

  let (_, manager) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-002", "Mia", "MANAGER", Some(ceo.id.0))),
  )
  .await;
  let (status, body) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-003", "Dee", "DIRECTOR", manager["id"].as_i64())),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "rank_violation");
}

#[tokio::test]
async fn viewers_cannot_write() {
  let (app, _) = app_with_ceo().await;
  send(&app, "POST", "/auth/register", None, Some(json!({
    "email": "viewer@example.com", "name": "Vi", "password": "secret1"
  })))
  .await;
  let viewer = ("viewer@example.com", "secret1");

  let (status, body) = send(
    &app, "POST", "/employees", Some(viewer),
    Some(employee_body("E-002", "Ian", "INTERN", None)),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "forbidden");

  let (status, roles) = send(&app, "GET", "/employees/available-roles", Some(viewer), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(roles, json!([]));

  let (status, _) = send(&app, "GET", "/employees", Some(viewer), None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn available_roles_for_ceo_exclude_ceo() {
  let (app, _) = app_with_ceo().await;
  let (_, roles) = send(&app, "GET", "/employees/available-roles", Some(CEO), None).await;
  let roles = roles.as_array().unwrap();
  assert_eq!(roles.len(), 8);
  assert_eq!(roles[0], json!({ "role": "CTO", "rank": 2 }));
  assert_eq!(roles[7]["role"], "INTERN");
}

#[tokio::test]
async fn deleting_a_manager_reports_subordinates() {
  let (app, ceo) = app_with_ceo().await;
  let (_, lead) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-002", "Tea", "TEAM_LEAD", Some(ceo.id.0))),
  )
  .await;
  let (_, a) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-003", "Ann", "JUNIOR_EMPLOYEE", lead["id"].as_i64())),
  )
  .await;
  let (_, b) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-004", "Bob", "JUNIOR_EMPLOYEE", lead["id"].as_i64())),
  )
  .await;

  let uri = format!("/employees/{}", lead["id"]);
  let (status, body) = send(&app, "DELETE", &uri, Some(CEO), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["kind"], "has_subordinates");
  let mut ids: Vec<i64> = body["subordinates"]
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v.as_i64().unwrap())
    .collect();
  ids.sort();
  assert_eq!(ids, [a["id"].as_i64().unwrap(), b["id"].as_i64().unwrap()]);

  for leaf in [&a, &b] {
    let (status, _) =
      send(&app, "DELETE", &format!("/employees/{}", leaf["id"]), Some(CEO), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }
  let (status, _) = send(&app, "DELETE", &uri, Some(CEO), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, "GET", &uri, Some(CEO), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_and_promote() {
  let (app, ceo) = app_with_ceo().await;
  let (_, intern) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-002", "Ian", "INTERN", Some(ceo.id.0))),
  )
  .await;
  let uri = format!("/employees/{}", intern["id"]);

  let (status, updated) = send(&app, "PUT", &uri, Some(CEO), Some(json!({
    "department": "Research", "salary": 42000
  })))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["department"], "Research");
  assert_eq!(updated["manager_id"], ceo.id.0);

  let (status, promoted) =
    send(&app, "POST", &format!("{uri}/promote"), Some(CEO), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(promoted["role"], "JUNIOR_EMPLOYEE");

  let ceo_uri = format!("/employees/{}/promote", ceo.id);
  let (status, body) = send(&app, "POST", &ceo_uri, Some(CEO), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "cannot_promote_further");
}

#[tokio::test]
async fn hierarchy_nests_reports_under_ceo() {
  let (app, ceo) = app_with_ceo().await;
  let (_, cto) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-002", "Grace", "CTO", Some(ceo.id.0))),
  )
  .await;
  send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-003", "Lin", "SENIOR_EMPLOYEE", cto["id"].as_i64())),
  )
  .await;

  let (status, chart) = send(&app, "GET", "/employees/hierarchy", Some(CEO), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(chart["roots"].as_array().unwrap().len(), 1);
  assert_eq!(chart["roots"][0]["role"], "CEO");
  assert_eq!(chart["roots"][0]["children"][0]["role"], "CTO");
  assert_eq!(chart["roots"][0]["children"][0]["children"][0]["name"], "Lin");
  assert_eq!(chart["detached"], json!([]));
}

// ─── Account administration ──────────────────────────────────────────────────

#[tokio::test]
async fn admin_links_account_to_employee() {
  let (app, ceo) = app_with_ceo().await;
  let (_, dir) = send(
    &app, "POST", "/employees", Some(CEO),
    Some(employee_body("E-002", "Dee", "DIRECTOR", Some(ceo.id.0))),
  )
  .await;

  let (_, unlinked) =
    send(&app, "GET", "/employees/available-for-accounts", Some(CEO), None).await;
  assert_eq!(unlinked.as_array().unwrap().len(), 1);

  let (status, account) = send(&app, "POST", "/auth/accounts", Some(CEO), Some(json!({
    "email": "dee@example.com", "name": "Dee", "password": "secret1", "role": "ADMIN"
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let uri = format!("/auth/accounts/{}/employee", account["account_id"].as_str().unwrap());
  let (status, linked) =
    send(&app, "PUT", &uri, Some(CEO), Some(json!({ "employee_id": dir["id"] }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(linked["employee_id"], dir["id"]);

  // The director may now create a manager but not a CTO.
  let dee = ("dee@example.com", "secret1");
  let (status, _) = send(
    &app, "POST", "/employees", Some(dee),
    Some(employee_body("E-003", "Mia", "MANAGER", dir["id"].as_i64())),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, body) = send(
    &app, "POST", "/employees", Some(dee),
    Some(employee_body("E-004", "Cal", "CTO", Some(ceo.id.0))),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "insufficient_permission");
}
