//! `authos-session`: inspect or reset the persisted session from a shell.
//!
//! Usage: `authos-session [status | logout | toggle-theme | check <path>]`

use std::sync::Arc;

use anyhow::{Context, bail};

use authos_auth::RouteTable;
use authos_client::{ClientConfig, FileStore, NavigationGuard, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    authos_observability::init();

    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    let storage = FileStore::open(config.state_file())?;
    let session = Arc::new(SessionStore::open(Arc::new(storage)));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("status");

    match command {
        "status" => {
            let snapshot = session.snapshot();
            tracing::info!(
                stage = %snapshot.stage(),
                user = snapshot.display_name(),
                user_id = ?snapshot.system_user.user_id().map(u64::from),
                tenant = snapshot.current_app.code().unwrap_or("-"),
                user_token = snapshot.user_token.is_some(),
                dark_theme = snapshot.theme_preference,
                state_file = %config.state_file().display(),
                "session status"
            );
        }
        "logout" => {
            session.logout();
        }
        "toggle-theme" => {
            let dark = session.toggle_theme();
            tracing::info!(dark_theme = dark, "theme toggled");
        }
        "check" => {
            let Some(path) = args.get(1) else {
                bail!("usage: authos-session check <path>");
            };
            let guard = NavigationGuard::new(session.clone(), RouteTable::admin_console(), config.redirects.clone());
            let decision = guard.before_each(path);
            tracing::info!(
                path = %path,
                allowed = decision.is_allowed(),
                redirect = guard.redirect_route(decision).unwrap_or("-"),
                "navigation check"
            );
        }
        other => bail!("unknown command {other:?}; expected status, logout, toggle-theme or check <path>"),
    }

    Ok(())
}
