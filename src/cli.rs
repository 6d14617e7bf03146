use crate::api::ApiClient;
use crate::config::{self, ConsoleConfig};
use crate::error::ApiError;
use crate::logging::{self, LogTarget};
use crate::model::{
    AddMember, CreateOrganization, CreateProject, CreateRun, CreateVariable, CreateWorkspace,
    ExecutionMode, Message, OrgRole, RunOperation, SignupRequest, UpdateMember, UpdateOrganization, UpdateProject,
    UpdateVariable, UpdateWorkspace, VariableCategory,
};
use crate::nav::Navigator;
use crate::orchestrator::{self, ConsoleEvent, RunDetail, RunDetailController, UiCommand, WorkspaceRunList};
use crate::session::{FileTokenStore, Session};
use crate::status::RunAction;
use crate::text_summary::{self, TextSummary};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const SESSION_EXPIRED: &str = "Session expired, run `terraconsole auth login`";

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

/// Renders command results as JSON or text through the output writer.
struct Output {
    json: bool,
    tx: mpsc::UnboundedSender<OutputLine>,
    handle: tokio::task::JoinHandle<()>,
}

impl Output {
    fn new(json: bool) -> Self {
        let (tx, handle) = spawn_output_writer();
        Self { json, tx, handle }
    }

    fn line(&self, msg: impl Into<String>) {
        let _ = self.tx.send(OutputLine::Stdout(msg.into()));
    }

    /// Status messages go to stderr so stdout stays parseable.
    fn note(&self, msg: impl Into<String>) {
        let _ = self.tx.send(OutputLine::Stderr(msg.into()));
    }

    fn summary(&self, summary: TextSummary) {
        for line in summary.lines {
            self.line(line);
        }
    }

    /// JSON when `--json` is set, else the text rendering.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> TextSummary) -> Result<()> {
        if self.json {
            self.line(serde_json::to_string_pretty(value)?);
        } else {
            self.summary(text(value));
        }
        Ok(())
    }

    /// Raw server documents are always printed as JSON.
    fn raw(&self, value: &serde_json::Value) -> Result<()> {
        self.line(serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn message(&self, msg: &Message, fallback: &str) -> Result<()> {
        if self.json {
            self.line(serde_json::to_string_pretty(msg)?);
        } else if msg.message.is_empty() {
            self.line(fallback);
        } else {
            self.line(msg.message.clone());
        }
        Ok(())
    }

    async fn finish(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "terraconsole",
    version,
    about = "Terminal console for TerraConsole: organizations, workspaces, variables, state and runs"
)]
pub struct Cli {
    /// Base URL of the TerraConsole API (e.g. http://localhost:8080/api)
    #[arg(long, env = "TERRACONSOLE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Path to config.toml (default: <config dir>/terraconsole/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// How often a live run is re-fetched (e.g. 3s, 500ms)
    #[arg(long, global = true)]
    pub poll_interval: Option<humantime::Duration>,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging to stderr (or to the log file while the TUI is open)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Sign up, log in and manage MFA
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Organizations and their members
    Orgs {
        #[command(subcommand)]
        command: OrgCommand,
    },
    /// Projects inside an organization
    Projects {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Workspaces inside a project
    Workspaces {
        #[command(subcommand)]
        command: WorkspaceCommand,
    },
    /// Workspace variables
    Vars {
        #[command(subcommand)]
        command: VarCommand,
    },
    /// Plan/apply runs
    Runs {
        #[command(subcommand)]
        command: RunCommand,
    },
    /// Terraform state of a workspace
    State {
        #[command(subcommand)]
        command: StateCommand,
    },
    /// Terraform binaries known to the server
    Tf {
        #[command(subcommand)]
        command: TfCommand,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum AuthCommand {
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "TERRACONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        full_name: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TERRACONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Six-digit code from the authenticator app, if MFA is enabled
        #[arg(long)]
        totp: Option<String>,
    },
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Exchange the stored token for a fresh one
    Refresh,
    Mfa {
        #[command(subcommand)]
        command: MfaCommand,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum MfaCommand {
    /// Generate a TOTP secret to enrol in an authenticator app
    Setup,
    /// Confirm enrolment with a code from the app
    Verify { code: String },
    Disable,
}

#[derive(Debug, Subcommand, Clone)]
pub enum OrgCommand {
    List,
    Create {
        /// Lowercased; characters outside [a-z0-9-] become '-'
        name: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    Members {
        org: String,
    },
    AddMember {
        org: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "member")]
        role: OrgRole,
    },
    UpdateMember {
        org: String,
        member: String,
        #[arg(long)]
        role: OrgRole,
    },
    RemoveMember {
        org: String,
        member: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ProjectCommand {
    List {
        org: String,
    },
    Create {
        org: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum WorkspaceCommand {
    List {
        project: String,
    },
    Create {
        project: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        terraform_version: Option<String>,
        #[arg(long)]
        working_directory: Option<String>,
        #[arg(long)]
        auto_apply: bool,
        #[arg(long)]
        vcs_repo_url: Option<String>,
        #[arg(long)]
        vcs_branch: Option<String>,
    },
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        terraform_version: Option<String>,
        #[arg(long)]
        working_directory: Option<String>,
        #[arg(long)]
        auto_apply: Option<bool>,
        /// local or agent
        #[arg(long)]
        execution_mode: Option<ExecutionMode>,
        #[arg(long, conflicts_with = "disconnect_vcs")]
        vcs_repo_url: Option<String>,
        #[arg(long, conflicts_with = "disconnect_vcs")]
        vcs_branch: Option<String>,
        /// Clear the repository link
        #[arg(long)]
        disconnect_vcs: bool,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    Lock {
        id: String,
    },
    Unlock {
        id: String,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum VarCommand {
    List {
        workspace: String,
    },
    Create {
        workspace: String,
        key: String,
        value: String,
        #[arg(long, default_value = "terraform")]
        category: VariableCategory,
        #[arg(long)]
        sensitive: bool,
        #[arg(long)]
        hcl: bool,
        #[arg(long, default_value = "")]
        description: String,
    },
    Update {
        workspace: String,
        var: String,
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        hcl: Option<bool>,
        #[arg(long)]
        sensitive: Option<bool>,
    },
    Delete {
        workspace: String,
        var: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogPhase {
    Plan,
    Apply,
    Both,
}

#[derive(Debug, Subcommand, Clone)]
pub enum RunCommand {
    List {
        workspace: String,
    },
    Create {
        workspace: String,
        /// plan, plan_and_apply, destroy or refresh
        #[arg(long, default_value = "plan")]
        operation: RunOperation,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        auto_apply: Option<bool>,
    },
    Show {
        id: String,
    },
    Logs {
        id: String,
        #[arg(long, value_enum, default_value_t = LogPhase::Both)]
        phase: LogPhase,
    },
    Approve {
        id: String,
    },
    Discard {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    Cancel {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Follow a run live until it finishes
    Watch {
        id: String,
        /// Print status changes instead of opening the TUI
        #[arg(long)]
        text: bool,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum StateCommand {
    Current { workspace: String },
    Versions { workspace: String },
    Version { workspace: String, version: String },
    Outputs { workspace: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum TfCommand {
    /// Releases available for install
    Versions,
    Installed,
    Install { version: String },
}

impl Cli {
    /// The TUI owns the terminal; everything else is line output.
    fn uses_tui(&self) -> bool {
        cfg!(feature = "tui")
            && matches!(
                self.command,
                Command::Runs {
                    command: RunCommand::Watch { text: false, .. }
                }
            )
    }
}

/// What the user sees for a failed command.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.chain().find_map(|c| c.downcast_ref::<ApiError>()) {
        Some(e) if e.is_unauthorized() => SESSION_EXPIRED.to_string(),
        Some(e) if matches!(e, ApiError::Api { .. }) => format!("Error: {}", e.user_message()),
        _ => format!("Error: {err:#}"),
    }
}

fn confirm(yes: bool, what: &str) -> Result<()> {
    if !yes {
        bail!("Refusing to {what} without --yes");
    }
    Ok(())
}

pub async fn run(args: Cli) -> Result<()> {
    let mut cfg = ConsoleConfig::load(args.config.as_deref())?
        .with_overrides(args.api_url.as_deref());
    if let Some(poll) = args.poll_interval {
        cfg.poll_interval = poll.into();
    }
    let target = if args.uses_tui() {
        LogTarget::File
    } else {
        LogTarget::Stderr
    };
    logging::init(target, args.verbose, &config::data_dir());
    tracing::debug!(api_url = %cfg.api_url, "starting");

    let tokens = Arc::new(FileTokenStore::new(cfg.token_path.clone()));
    let api = ApiClient::new(&cfg, tokens, Navigator::default())?;

    let out = Output::new(args.json);
    let res = dispatch(args.command, &cfg, api, &out).await;
    out.finish().await;
    res
}

async fn dispatch(cmd: Command, cfg: &ConsoleConfig, api: ApiClient, out: &Output) -> Result<()> {
    match cmd {
        Command::Auth { command } => auth(command, api, out).await,
        Command::Orgs { command } => orgs(command, api, out).await,
        Command::Projects { command } => projects(command, api, out).await,
        Command::Workspaces { command } => workspaces(command, api, out).await,
        Command::Vars { command } => vars(command, api, out).await,
        Command::Runs { command } => runs(command, cfg, api, out).await,
        Command::State { command } => state(command, api, out).await,
        Command::Tf { command } => tf(command, api, out).await,
    }
}

/// Map login failures to actionable messages.
fn login_error(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<ApiError>() {
        Some(e) if e.is_mfa_required() => anyhow!("MFA code required, pass --totp <code>"),
        Some(ApiError::Unauthorized { message }) => anyhow!("Login failed: {message}"),
        _ => err,
    }
}

async fn auth(cmd: AuthCommand, api: ApiClient, out: &Output) -> Result<()> {
    let mut session = Session::new(api);
    match cmd {
        AuthCommand::Signup {
            email,
            username,
            password,
            full_name,
        } => {
            let req = SignupRequest {
                email,
                username,
                password,
                full_name,
            };
            let auth = session.signup(&req).await?;
            out.note(format!("Account created. Logged in as {}", auth.user.username));
        }
        AuthCommand::Login {
            email,
            password,
            totp,
        } => {
            let auth = session
                .login(&email, &password, totp)
                .await
                .map_err(login_error)?;
            out.note(format!("Logged in as {}", auth.user.username));
        }
        AuthCommand::Logout => {
            session.logout();
            out.note("Logged out");
        }
        AuthCommand::Whoami => {
            let session = Session::init(session.api().clone()).await;
            let user = match session.current_user() {
                Some(user) if session.is_authenticated() => user,
                // init keeps the token only when the server could not be reached
                _ if session.has_token() => {
                    bail!("Could not reach {}", session.api().base_url())
                }
                _ => bail!("Not logged in"),
            };
            out.emit(user, |u| TextSummary {
                lines: vec![
                    format!("{} <{}>", u.username, u.email),
                    format!(
                        "Name: {}",
                        if u.full_name.is_empty() { "-" } else { u.full_name.as_str() }
                    ),
                    format!("MFA:  {}", if u.mfa_enabled { "enabled" } else { "disabled" }),
                ],
            })?;
        }
        AuthCommand::Refresh => {
            if !session.has_token() {
                bail!("Not logged in");
            }
            session.refresh_token().await?;
            out.note("Session refreshed");
        }
        AuthCommand::Mfa { command } => match command {
            MfaCommand::Setup => {
                let setup = session.api().mfa_setup().await?;
                out.emit(&setup, |s| TextSummary {
                    lines: vec![
                        format!("Secret: {}", s.secret),
                        format!("URL:    {}", s.url),
                        "Add it to your authenticator app, then run `terraconsole auth mfa verify <code>`".into(),
                    ],
                })?;
            }
            MfaCommand::Verify { code } => {
                let msg = session.api().mfa_verify(&code).await?;
                out.message(&msg, "MFA enabled")?;
            }
            MfaCommand::Disable => {
                let msg = session.api().mfa_disable().await?;
                out.message(&msg, "MFA disabled")?;
            }
        },
    }
    Ok(())
}

async fn orgs(cmd: OrgCommand, api: ApiClient, out: &Output) -> Result<()> {
    match cmd {
        OrgCommand::List => {
            let orgs = api.list_organizations().await?;
            out.emit(&orgs, |o| text_summary::build_organizations(o))?;
        }
        OrgCommand::Create {
            name,
            display_name,
            email,
            description,
        } => {
            let req = CreateOrganization {
                display_name,
                email,
                description,
                ..CreateOrganization::new(&name)
            };
            if req.name != name {
                out.note(format!("Using name '{}'", req.name));
            }
            let org = api.create_organization(&req).await?;
            out.emit(&org, |o| text_summary::build_organizations(std::slice::from_ref(o)))?;
        }
        OrgCommand::Show { id } => {
            let org = api.get_organization(&id).await?;
            out.emit(&org, |o| text_summary::build_organizations(std::slice::from_ref(o)))?;
        }
        OrgCommand::Update {
            id,
            display_name,
            email,
            description,
        } => {
            let req = UpdateOrganization {
                display_name,
                email,
                description,
            };
            if req == UpdateOrganization::default() {
                bail!("Nothing to update");
            }
            let org = api.update_organization(&id, &req).await?;
            out.emit(&org, |o| text_summary::build_organizations(std::slice::from_ref(o)))?;
        }
        OrgCommand::Delete { id, yes } => {
            confirm(yes, &format!("delete organization {id}"))?;
            let msg = api.delete_organization(&id).await?;
            out.message(&msg, "Organization deleted")?;
        }
        OrgCommand::Members { org } => {
            let members = api.list_members(&org).await?;
            out.emit(&members, |m| text_summary::build_members(m))?;
        }
        OrgCommand::AddMember { org, email, role } => {
            let member = api.add_member(&org, &AddMember { email, role }).await?;
            out.emit(&member, |m| text_summary::build_members(std::slice::from_ref(m)))?;
        }
        OrgCommand::UpdateMember { org, member, role } => {
            let msg = api.update_member(&org, &member, &UpdateMember { role }).await?;
            out.message(&msg, "Member role updated")?;
        }
        OrgCommand::RemoveMember { org, member, yes } => {
            confirm(yes, &format!("remove member {member}"))?;
            let msg = api.remove_member(&org, &member).await?;
            out.message(&msg, "Member removed")?;
        }
    }
    Ok(())
}

async fn projects(cmd: ProjectCommand, api: ApiClient, out: &Output) -> Result<()> {
    match cmd {
        ProjectCommand::List { org } => {
            let projects = api.list_projects(&org).await?;
            out.emit(&projects, |p| text_summary::build_projects(p))?;
        }
        ProjectCommand::Create {
            org,
            name,
            description,
        } => {
            let project = api
                .create_project(&org, &CreateProject { name, description })
                .await?;
            out.emit(&project, |p| text_summary::build_projects(std::slice::from_ref(p)))?;
        }
        ProjectCommand::Show { id } => {
            let project = api.get_project(&id).await?;
            out.emit(&project, |p| text_summary::build_projects(std::slice::from_ref(p)))?;
        }
        ProjectCommand::Update {
            id,
            name,
            description,
        } => {
            let req = UpdateProject { name, description };
            if req == UpdateProject::default() {
                bail!("Nothing to update");
            }
            let project = api.update_project(&id, &req).await?;
            out.emit(&project, |p| text_summary::build_projects(std::slice::from_ref(p)))?;
        }
        ProjectCommand::Delete { id, yes } => {
            confirm(yes, &format!("delete project {id}"))?;
            let msg = api.delete_project(&id).await?;
            out.message(&msg, "Project deleted")?;
        }
    }
    Ok(())
}

async fn workspaces(cmd: WorkspaceCommand, api: ApiClient, out: &Output) -> Result<()> {
    match cmd {
        WorkspaceCommand::List { project } => {
            let list = api.list_workspaces(&project).await?;
            out.emit(&list, |w| text_summary::build_workspaces(w))?;
        }
        WorkspaceCommand::Create {
            project,
            name,
            description,
            terraform_version,
            working_directory,
            auto_apply,
            vcs_repo_url,
            vcs_branch,
        } => {
            let req = CreateWorkspace {
                name,
                description,
                terraform_version,
                working_directory,
                auto_apply,
                vcs_repo_url,
                vcs_branch,
            };
            let ws = api.create_workspace(&project, &req).await?;
            out.emit(&ws, text_summary::build_workspace)?;
        }
        WorkspaceCommand::Show { id } => {
            let ws = api.get_workspace(&id).await?;
            out.emit(&ws, text_summary::build_workspace)?;
        }
        WorkspaceCommand::Update {
            id,
            name,
            description,
            terraform_version,
            working_directory,
            auto_apply,
            execution_mode,
            vcs_repo_url,
            vcs_branch,
            disconnect_vcs,
        } => {
            let base = if disconnect_vcs {
                UpdateWorkspace::disconnect_vcs()
            } else {
                UpdateWorkspace {
                    vcs_repo_url,
                    vcs_branch,
                    ..Default::default()
                }
            };
            let req = UpdateWorkspace {
                name,
                description,
                terraform_version,
                working_directory,
                auto_apply,
                execution_mode,
                ..base
            };
            if req.is_empty() {
                bail!("Nothing to update");
            }
            let ws = api.update_workspace(&id, &req).await?;
            out.emit(&ws, text_summary::build_workspace)?;
        }
        WorkspaceCommand::Delete { id, yes } => {
            confirm(yes, &format!("delete workspace {id}"))?;
            let msg = api.delete_workspace(&id).await?;
            out.message(&msg, "Workspace deleted")?;
        }
        WorkspaceCommand::Lock { id } => set_lock(api, &id, true, out).await?,
        WorkspaceCommand::Unlock { id } => set_lock(api, &id, false, out).await?,
    }
    Ok(())
}

async fn set_lock(api: ApiClient, id: &str, locked: bool, out: &Output) -> Result<()> {
    let list = WorkspaceRunList::new(Arc::new(api), id);
    let ws = list.set_locked(locked).await?;
    out.note(if ws.locked {
        "Workspace locked"
    } else {
        "Workspace unlocked"
    });
    out.emit(&ws, text_summary::build_workspace)
}

async fn vars(cmd: VarCommand, api: ApiClient, out: &Output) -> Result<()> {
    match cmd {
        VarCommand::List { workspace } => {
            let list = api.list_variables(&workspace).await?;
            out.emit(&list, |v| text_summary::build_variables(v))?;
        }
        VarCommand::Create {
            workspace,
            key,
            value,
            category,
            sensitive,
            hcl,
            description,
        } => {
            let req = CreateVariable {
                key,
                value,
                category,
                sensitive,
                hcl,
                description,
            };
            let var = api.create_variable(&workspace, &req).await?;
            out.emit(&var, |v| text_summary::build_variables(std::slice::from_ref(v)))?;
        }
        VarCommand::Update {
            workspace,
            var,
            value,
            description,
            hcl,
            sensitive,
        } => {
            let req = UpdateVariable {
                value,
                description,
                hcl,
                sensitive,
            };
            if req == UpdateVariable::default() {
                bail!("Nothing to update");
            }
            let var = api.update_variable(&workspace, &var, &req).await?;
            out.emit(&var, |v| text_summary::build_variables(std::slice::from_ref(v)))?;
        }
        VarCommand::Delete {
            workspace,
            var,
            yes,
        } => {
            confirm(yes, &format!("delete variable {var}"))?;
            let msg = api.delete_variable(&workspace, &var).await?;
            out.message(&msg, "Variable deleted")?;
        }
    }
    Ok(())
}

fn detail_json(detail: &RunDetail) -> serde_json::Value {
    serde_json::json!({
        "run": detail.run,
        "plan_log": detail.plan_log.text(),
        "apply_log": detail.apply_log.text(),
    })
}

fn emit_detail(out: &Output, detail: &RunDetail) -> Result<()> {
    out.emit(&detail_json(detail), |_| text_summary::build_run_detail(detail))
}

async fn runs(cmd: RunCommand, cfg: &ConsoleConfig, api: ApiClient, out: &Output) -> Result<()> {
    let api = Arc::new(api);
    match cmd {
        RunCommand::List { workspace } => {
            let list = WorkspaceRunList::new(api, workspace);
            list.refresh().await?;
            out.emit(&list.runs(), |_| text_summary::build_run_rows(&list.rows()))?;
        }
        RunCommand::Create {
            workspace,
            operation,
            message,
            auto_apply,
        } => {
            let list = WorkspaceRunList::new(api, workspace);
            list.refresh().await?;
            if !list.can_create_run() {
                bail!("Workspace is locked; unlock it before starting a run");
            }
            let req = CreateRun {
                operation,
                message,
                auto_apply,
            };
            let run = list.create_run(&req).await?;
            out.note(format!("Run created: {}", run.id));
            out.emit(&run, |r| TextSummary {
                lines: text_summary::run_lines(r),
            })?;
        }
        RunCommand::Show { id } => {
            let ctl = RunDetailController::new(api, id);
            if let Some(detail) = ctl.load().await? {
                emit_detail(out, &detail)?;
            }
        }
        RunCommand::Logs { id, phase } => {
            let ctl = RunDetailController::new(api, id);
            let Some(detail) = ctl.load().await? else {
                return Ok(());
            };
            if out.json {
                out.raw(&detail_json(&detail))?;
                return Ok(());
            }
            if matches!(phase, LogPhase::Plan | LogPhase::Both) {
                out.line(detail.plan_log.text().to_string());
            }
            if matches!(phase, LogPhase::Apply | LogPhase::Both) {
                out.line(detail.apply_log.text().to_string());
            }
        }
        RunCommand::Approve { id } => act(api, id, RunAction::Approve, out).await?,
        RunCommand::Discard { id, yes } => {
            confirm(yes, &format!("discard run {id}"))?;
            act(api, id, RunAction::Discard, out).await?
        }
        RunCommand::Cancel { id, yes } => {
            confirm(yes, &format!("cancel run {id}"))?;
            act(api, id, RunAction::Cancel, out).await?
        }
        RunCommand::Watch { id, text } => {
            #[cfg(feature = "tui")]
            {
                if !text {
                    return crate::tui::run(api, id, cfg.poll_interval).await;
                }
            }
            #[cfg(not(feature = "tui"))]
            let _ = text;
            watch_text(api, id, cfg, out).await?
        }
    }
    Ok(())
}

/// Load, check the action is offered for the current status, trigger it,
/// and print the re-fetched run.
async fn act(api: Arc<ApiClient>, id: String, action: RunAction, out: &Output) -> Result<()> {
    let ctl = RunDetailController::new(api, id);
    ctl.load().await?;
    let outcome = ctl.perform(action).await?;
    out.note(outcome.message);
    if let Some(detail) = outcome.detail {
        emit_detail(out, &detail)?;
    }
    Ok(())
}

/// Follow mode without the TUI: one line per status change, the full run
/// once it reaches a terminal status.
async fn watch_text(
    api: Arc<ApiClient>,
    id: String,
    cfg: &ConsoleConfig,
    out: &Output,
) -> Result<()> {
    let detail = Arc::new(RunDetailController::new(api, id));
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ConsoleEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let controller = tokio::spawn(orchestrator::run_controller(
        detail,
        cfg.poll_interval,
        event_tx,
        cmd_rx,
    ));

    let mut last_status = None;
    let mut expired = false;
    loop {
        tokio::select! {
            ev = event_rx.recv() => {
                let Some(ev) = ev else { break };
                match ev {
                    ConsoleEvent::Loaded(d) => {
                        let status = d.status();
                        if last_status != Some(status) {
                            let meta = status.meta();
                            out.note(format!("{} {}", meta.icon, meta.label));
                            last_status = Some(status);
                        }
                        if status.is_terminal() {
                            emit_detail(out, &d)?;
                            let _ = cmd_tx.send(UiCommand::Quit);
                        }
                    }
                    ConsoleEvent::Info(msg) | ConsoleEvent::ActionFailed(msg) => out.note(msg),
                    ConsoleEvent::LoadFailed(msg) => out.note(format!("Refresh failed: {msg}")),
                    ConsoleEvent::SessionExpired => expired = true,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = cmd_tx.send(UiCommand::Quit);
            }
        }
    }

    controller.await.context("watch task failed")??;
    if expired {
        return Err(ApiError::Unauthorized {
            message: "Unauthorized".into(),
        }
        .into());
    }
    Ok(())
}

async fn state(cmd: StateCommand, api: ApiClient, out: &Output) -> Result<()> {
    match cmd {
        StateCommand::Current { workspace } => out.raw(&api.current_state(&workspace).await?)?,
        StateCommand::Versions { workspace } => {
            let versions = api.list_state_versions(&workspace).await?;
            out.emit(&versions, |v| text_summary::build_state_versions(v))?;
        }
        StateCommand::Version { workspace, version } => {
            out.raw(&api.get_state_version(&workspace, &version).await?)?
        }
        StateCommand::Outputs { workspace } => out.raw(&api.state_outputs(&workspace).await?)?,
    }
    Ok(())
}

async fn tf(cmd: TfCommand, api: ApiClient, out: &Output) -> Result<()> {
    match cmd {
        TfCommand::Versions => {
            let versions = api.terraform_versions().await?;
            out.emit(&versions, |v| text_summary::build_tf_versions(v))?;
        }
        TfCommand::Installed => {
            let versions = api.installed_terraform_versions().await?;
            out.emit(&versions, |v| text_summary::build_tf_versions(v))?;
        }
        TfCommand::Install { version } => {
            out.note(format!("Installing Terraform {version}…"));
            let res = api.install_terraform(&version).await?;
            out.emit(&res, |r| TextSummary {
                lines: vec![format!("Installed {} at {}", r.version, r.path)],
            })?;
        }
    }
    Ok(())
}
