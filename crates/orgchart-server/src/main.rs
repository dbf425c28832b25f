//! orgchart server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `ORGCHART_*` environment variables, opens the SQLite store, and serves
//! the JSON API over HTTP.
//!
//! # First run
//!
//! An empty directory has no one who may create a CEO. Seed one, together
//! with an administrator account linked to them:
//!
//! ```text
//! orgchart-server --bootstrap-admin admin@example.com
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use orgchart_api::auth::{check_password_strength, hash_password};
use orgchart_core::{
  account::{AccountRole, NewAccount},
  employee::NewEmployee,
  role::Role,
};
use orgchart_server::ServerConfig;
use orgchart_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Organizational hierarchy server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an admin account with this email and a linked CEO employee,
  /// reading the password from stdin, then exit.
  #[arg(long, value_name = "EMAIL")]
  bootstrap_admin: Option<String>,

  /// Given name of the bootstrapped CEO.
  #[arg(long, default_value = "System", requires = "bootstrap_admin")]
  name: String,

  /// Surname of the bootstrapped CEO.
  #[arg(long, default_value = "Administrator", requires = "bootstrap_admin")]
  surname: String,

  /// Employee number of the bootstrapped CEO.
  #[arg(long, default_value = "E1", requires = "bootstrap_admin")]
  employee_number: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg =
    ServerConfig::load(cli.config.clone()).context("failed to load configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: seed the CEO and exit.
  if let Some(email) = cli.bootstrap_admin {
    return bootstrap(&store, email, cli.name, cli.surname, cli.employee_number).await;
  }

  let app = orgchart_server::app(Arc::new(store));
  let address = server_cfg.address();

  tracing::info!(store = ?store_path, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn bootstrap(
  store: &SqliteStore,
  email: String,
  name: String,
  surname: String,
  employee_number: String,
) -> anyhow::Result<()> {
  let password = read_password()?;
  check_password_strength(&password)?;
  let password_hash = hash_password(&password)?;

  let mut ceo = NewEmployee::new(employee_number, name.clone(), surname.clone(), Role::Ceo)
    .in_department("Management");
  ceo.email = Some(email.clone());

  let (account, employee) = store
    .bootstrap(
      NewAccount {
        email,
        name: format!("{name} {surname}"),
        password_hash,
        role: AccountRole::Admin,
        employee_id: None,
      },
      ceo,
    )
    .await
    .context("failed to bootstrap administrator")?;

  tracing::info!(
    account = %account.account_id,
    employee = %employee.id,
    "administrator and CEO created"
  );
  println!("Created {} ({}) as CEO #{}", account.email, employee.full_name(), employee.id);
  Ok(())
}

/// Read one line from stdin as the password.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
