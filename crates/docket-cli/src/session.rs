//! Acting-user resolution for CLI commands.
//!
//! The resolution chain: `DOCKET_USER_ID` env (with optional `DOCKET_USERNAME`
//! and `DOCKET_ROLE`) > the stored `loggedInUser` session > anonymous.
//! Nothing here fails for lack of a user; the core decides which operations
//! need one.

use docket_core::identity::{SessionSource, StoredSession};
use docket_core::store::Store;
use docket_core::{CurrentUser, UserId};
use std::env;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

/// Real environment reader.
struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Identity pinned through the environment, if any.
fn user_from_env(env: &dyn EnvReader) -> Option<CurrentUser> {
    let id: UserId = env.get("DOCKET_USER_ID")?.parse().ok()?;
    let username = env.get("DOCKET_USERNAME").unwrap_or_else(|| id.to_string());
    let user = CurrentUser::new(id, username);
    Some(match env.get("DOCKET_ROLE") {
        Some(role) => user.with_role(role),
        None => user,
    })
}

fn resolve_user_with(
    env: &dyn EnvReader,
    session: &dyn SessionSource,
) -> docket_core::Result<Option<CurrentUser>> {
    if let Some(user) = user_from_env(env) {
        return Ok(Some(user));
    }
    session.resolve()
}

/// Resolve the acting user for this invocation.
///
/// # Errors
///
/// Returns a storage error if the stored session is unreadable.
pub fn resolve_user(store: &dyn Store) -> docket_core::Result<Option<CurrentUser>> {
    resolve_user_with(&RealEnv, &StoredSession::new(store))
}

/// `"alice (1)"`, or `"anonymous"`.
pub fn describe(user: Option<&CurrentUser>) -> String {
    user.map_or_else(
        || "anonymous".to_string(),
        |u| format!("{} ({})", u.username, u.id),
    )
}
