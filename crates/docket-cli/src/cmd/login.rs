//! `dk login`, `dk logout`, `dk whoami` — the stored session record.

use std::path::Path;

use clap::Args;
use docket_core::identity::SessionWriter;
use docket_core::{CurrentUser, UserId};
use serde::Serialize;

use crate::cmd::Project;
use crate::output::{OutputMode, fail, render};
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// User ID (numeric or text).
    #[arg(long)]
    pub id: String,

    /// Display name. Defaults to the ID.
    #[arg(short, long)]
    pub username: Option<String>,

    /// Role label, e.g. Admin.
    #[arg(short, long)]
    pub role: Option<String>,
}

#[derive(Args, Debug)]
pub struct LogoutArgs {}

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

#[derive(Debug, Serialize)]
struct SessionView {
    user: Option<CurrentUser>,
}

impl LoginArgs {
    fn to_user(&self) -> CurrentUser {
        let Ok(id) = self.id.parse::<UserId>();
        let username = self.username.clone().unwrap_or_else(|| id.to_string());
        let user = CurrentUser::new(id, username);
        match &self.role {
            Some(role) => user.with_role(role.clone()),
            None => user,
        }
    }
}

pub fn run_login(args: &LoginArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let user = args.to_user();

    SessionWriter::new(&project.store)
        .sign_in(&user)
        .map_err(|e| fail(output, e))?;

    render(output, &SessionView { user: Some(user) }, |v, w| {
        writeln!(w, "Signed in as {}", session::describe(v.user.as_ref()))
    })
}

pub fn run_logout(
    _args: &LogoutArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;

    SessionWriter::new(&project.store)
        .sign_out()
        .map_err(|e| fail(output, e))?;

    render(output, &SessionView { user: None }, |_, w| {
        writeln!(w, "Signed out")
    })
}

pub fn run_whoami(
    _args: &WhoamiArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let user = project.current_user(output)?;

    render(output, &SessionView { user }, |v, w| {
        writeln!(w, "{}", session::describe(v.user.as_ref()))
    })
}
