//! JSON REST API for the organizational hierarchy service.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`EmployeeStore`] and [`AccountStore`]. Requests authenticate with HTTP
//! Basic credentials; TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", orgchart_api::api_router(store.clone()))
//! ```

pub mod accounts;
pub mod auth;
pub mod avatar;
pub mod employees;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use orgchart_core::store::{AccountStore, EmployeeStore};

pub use error::ApiError;

/// A backend serving both employees and accounts.
pub trait Directory: EmployeeStore + AccountStore + 'static {}

impl<T: EmployeeStore + AccountStore + 'static> Directory for T {}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Directory>(store: Arc<S>) -> Router<()> {
  Router::new()
    // Accounts
    .route("/auth/register", post(accounts::register::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/me", get(accounts::me))
    .route("/auth/accounts", post(accounts::create::<S>))
    .route("/auth/accounts/{id}/employee", put(accounts::link::<S>))
    // Employees
    .route("/employees", get(employees::list::<S>).post(employees::create::<S>))
    .route("/employees/hierarchy", get(employees::hierarchy::<S>))
    .route("/employees/departments", get(employees::departments::<S>))
    .route("/employees/potential-managers", get(employees::potential_managers::<S>))
    .route("/employees/available-roles", get(employees::available_roles))
    .route(
      "/employees/available-for-accounts",
      get(employees::available_for_accounts::<S>),
    )
    .route("/employees/dashboard-stats", get(employees::dashboard_stats::<S>))
    .route(
      "/employees/{id}",
      get(employees::get_one::<S>)
        .put(employees::update::<S>)
        .delete(employees::delete_one::<S>),
    )
    .route("/employees/{id}/promote", post(employees::promote::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
