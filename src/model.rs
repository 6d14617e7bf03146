use crate::status::RunStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaSetup {
    pub secret: String,
    /// `data:image/png;base64,...`
    pub qr_code: String,
    /// `otpauth://` provisioning URL.
    pub url: String,
}

/// Acknowledgement body returned by deletes, lock toggles and run actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBody {
    #[serde(default)]
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl OrgRole {
    pub fn as_str(self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
            OrgRole::Viewer => "viewer",
        }
    }
}

impl std::str::FromStr for OrgRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(OrgRole::Owner),
            "admin" => Ok(OrgRole::Admin),
            "member" => Ok(OrgRole::Member),
            "viewer" => Ok(OrgRole::Viewer),
            other => Err(format!(
                "unknown role '{other}' (expected owner, admin, member or viewer)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgMember {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    #[serde(default)]
    pub user: Option<User>,
    pub role: OrgRole,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub organization_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Local,
    Agent,
    #[serde(other)]
    Unknown,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Local
    }
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Local => "local",
            ExecutionMode::Agent => "agent",
            ExecutionMode::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(ExecutionMode::Local),
            "agent" => Ok(ExecutionMode::Agent),
            other => Err(format!("unknown execution mode '{other}' (expected local or agent)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub project_id: String,
    #[serde(default)]
    pub terraform_version: String,
    #[serde(default)]
    pub working_directory: String,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    /// Advisory copy of the server's lock. Re-fetch after lock/unlock.
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub locked_by: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub locked_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub vcs_repo_url: String,
    #[serde(default)]
    pub vcs_branch: String,
    #[serde(default)]
    pub current_state_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Workspace {
    pub fn has_vcs(&self) -> bool {
        !self.vcs_repo_url.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableCategory {
    Terraform,
    Env,
}

impl Default for VariableCategory {
    fn default() -> Self {
        VariableCategory::Terraform
    }
}

impl VariableCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableCategory::Terraform => "terraform",
            VariableCategory::Env => "env",
        }
    }
}

impl std::str::FromStr for VariableCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terraform" => Ok(VariableCategory::Terraform),
            "env" => Ok(VariableCategory::Env),
            other => Err(format!("unknown category '{other}' (expected terraform or env)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub workspace_id: String,
    pub key: String,
    /// Masked by the server for sensitive variables.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: VariableCategory,
    #[serde(default)]
    pub hcl: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOperation {
    Plan,
    PlanAndApply,
    Destroy,
    Refresh,
    #[serde(other)]
    Unknown,
}

impl RunOperation {
    /// Heading used by the run detail view.
    pub fn title(self) -> &'static str {
        match self {
            RunOperation::Destroy => "🗑️ Destroy Run",
            RunOperation::Refresh => "🔄 Refresh Run",
            RunOperation::Plan => "📋 Plan Only",
            RunOperation::PlanAndApply | RunOperation::Unknown => "🚀 Plan & Apply",
        }
    }

    /// Compact form used in run list rows.
    pub fn short_title(self) -> &'static str {
        match self {
            RunOperation::Destroy => "🗑️ Destroy",
            RunOperation::Refresh => "🔄 Refresh",
            RunOperation::Plan => "📋 Plan Only",
            RunOperation::PlanAndApply | RunOperation::Unknown => "🚀 Plan & Apply",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunOperation::Plan => "plan",
            RunOperation::PlanAndApply => "plan_and_apply",
            RunOperation::Destroy => "destroy",
            RunOperation::Refresh => "refresh",
            RunOperation::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for RunOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(RunOperation::Plan),
            "plan_and_apply" | "apply" => Ok(RunOperation::PlanAndApply),
            "destroy" => Ok(RunOperation::Destroy),
            "refresh" => Ok(RunOperation::Refresh),
            other => Err(format!(
                "unknown operation '{other}' (expected plan, plan_and_apply, destroy or refresh)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub workspace_id: String,
    pub status: RunStatus,
    pub operation: RunOperation,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_destroy: bool,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default)]
    pub terraform_version: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub creator: Option<User>,
    #[serde(default)]
    pub resources_added: u32,
    #[serde(default)]
    pub resources_changed: u32,
    #[serde(default)]
    pub resources_deleted: u32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub plan_completed_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub applied_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelinePhase {
    Created,
    Started,
    Planned,
    Applied,
    Completed,
}

impl TimelinePhase {
    pub fn label(self) -> &'static str {
        match self {
            TimelinePhase::Created => "Created",
            TimelinePhase::Started => "Started",
            TimelinePhase::Planned => "Planned",
            TimelinePhase::Applied => "Applied",
            TimelinePhase::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Add,
    Change,
    Destroy,
}

/// One resource-change counter, rendered as `+N`, `~N` or `-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub kind: DeltaKind,
    pub count: u32,
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.kind {
            DeltaKind::Add => '+',
            DeltaKind::Change => '~',
            DeltaKind::Destroy => '-',
        };
        write!(f, "{sign}{}", self.count)
    }
}

impl Run {
    /// Phase timestamps that are set, in lifecycle order.
    pub fn timeline(&self) -> Vec<(TimelinePhase, OffsetDateTime)> {
        let mut out = vec![(TimelinePhase::Created, self.created_at)];
        let optional = [
            (TimelinePhase::Started, self.started_at),
            (TimelinePhase::Planned, self.plan_completed_at),
            (TimelinePhase::Applied, self.applied_at),
            (TimelinePhase::Completed, self.completed_at),
        ];
        out.extend(optional.into_iter().filter_map(|(p, t)| t.map(|t| (p, t))));
        out
    }

    /// Set timestamps never go backwards. Skipped phases are allowed.
    pub fn timeline_is_monotonic(&self) -> bool {
        self.timeline().windows(2).all(|w| w[0].1 <= w[1].1)
    }

    /// Counters to show in compact rows: only the non-zero ones.
    pub fn deltas(&self) -> Vec<Delta> {
        [
            Delta {
                kind: DeltaKind::Add,
                count: self.resources_added,
            },
            Delta {
                kind: DeltaKind::Change,
                count: self.resources_changed,
            },
            Delta {
                kind: DeltaKind::Destroy,
                count: self.resources_deleted,
            },
        ]
        .into_iter()
        .filter(|d| d.count > 0)
        .collect()
    }

    pub fn creator_name(&self) -> &str {
        self.creator
            .as_ref()
            .map(|u| u.username.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVersion {
    pub id: String,
    pub workspace_id: String,
    #[serde(default)]
    pub run_id: Option<String>,
    pub serial: i64,
    #[serde(default)]
    pub lineage: String,
    #[serde(default)]
    pub state_hash: String,
    /// JSON-encoded outputs map, as stored by the server.
    #[serde(default)]
    pub outputs: String,
    #[serde(default)]
    pub resource_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfVersion {
    pub version: String,
    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallResult {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub version: String,
}

// Request shapes. Optional fields are omitted from the body so partial
// updates only touch what the caller set.

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CodeRequest<'a> {
    pub code: &'a str,
}

/// Lowercase and replace everything outside `[a-z0-9-]` with `-`.
pub fn normalize_org_name(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrganization {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateOrganization {
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_org_name(name),
            display_name: None,
            email: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateOrganization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddMember {
    pub email: String,
    pub role: OrgRole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateMember {
    pub role: OrgRole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateWorkspace {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    pub auto_apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateWorkspace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_apply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<ExecutionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_branch: Option<String>,
}

impl UpdateWorkspace {
    /// Clears the VCS link; runs stop being triggered by commits.
    pub fn disconnect_vcs() -> Self {
        Self {
            vcs_repo_url: Some(String::new()),
            vcs_branch: Some(String::new()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateVariable {
    pub key: String,
    pub value: String,
    pub category: VariableCategory,
    pub sensitive: bool,
    pub hcl: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateVariable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hcl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRun {
    pub operation: RunOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_apply: Option<bool>,
}

/// Render a timestamp in the local offset, falling back to UTC.
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    let fmt = time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    );
    let local = time::UtcOffset::current_local_offset()
        .map(|off| ts.to_offset(off))
        .unwrap_or(ts);
    local.format(&fmt).unwrap_or_else(|_| ts.to_string())
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn org_name_is_normalized() {
        assert_eq!(normalize_org_name("My Org!"), "my-org-");
        assert_eq!(normalize_org_name("acme-42"), "acme-42");
        assert_eq!(normalize_org_name("Ünïcode_Co"), "-n-code-co");
        assert_eq!(CreateOrganization::new("My Org!").name, "my-org-");
    }

    #[test]
    fn run_decodes_go_payload() {
        let run = fixtures::run("r-1", RunStatus::Planning);
        assert_eq!(run.status, RunStatus::Planning);
        assert_eq!(run.operation, RunOperation::PlanAndApply);
        assert_eq!(run.creator_name(), "ada");
        assert!(run.started_at.is_none());
    }

    #[test]
    fn unknown_operation_and_status_still_decode() {
        let mut v = fixtures::run_json("r-2", "policy_override");
        v["operation"] = "import".into();
        let run: Run = serde_json::from_value(v).unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert_eq!(run.operation, RunOperation::Unknown);
    }

    #[test]
    fn deltas_skip_zero_counters() {
        let mut run = fixtures::run("r-3", RunStatus::Applied);
        run.resources_added = 3;
        run.resources_changed = 0;
        run.resources_deleted = 1;
        let rendered: Vec<String> = run.deltas().iter().map(|d| d.to_string()).collect();
        assert_eq!(rendered, vec!["+3", "-1"]);
    }

    #[test]
    fn timeline_lists_only_set_phases() {
        let mut v = fixtures::run_json("r-4", "cancelled");
        v["completed_at"] = "2024-05-02T10:00:05Z".into();
        let run: Run = serde_json::from_value(v).unwrap();
        let phases: Vec<TimelinePhase> = run.timeline().into_iter().map(|(p, _)| p).collect();
        assert_eq!(phases, vec![TimelinePhase::Created, TimelinePhase::Completed]);
        assert!(run.timeline_is_monotonic());
    }

    #[test]
    fn timeline_detects_out_of_order_timestamps() {
        let mut v = fixtures::run_json("r-5", "applied");
        v["started_at"] = "2024-05-02T10:00:10Z".into();
        v["plan_completed_at"] = "2024-05-02T10:00:05Z".into();
        let run: Run = serde_json::from_value(v).unwrap();
        assert!(!run.timeline_is_monotonic());
    }

    #[test]
    fn missing_creator_reads_as_unknown() {
        let mut v = fixtures::run_json("r-6", "pending");
        v.as_object_mut().unwrap().remove("creator");
        let run: Run = serde_json::from_value(v).unwrap();
        assert_eq!(run.creator_name(), "Unknown");
    }

    #[test]
    fn partial_updates_omit_unset_fields() {
        let body = serde_json::to_value(UpdateWorkspace {
            auto_apply: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "auto_apply": true }));

        let body = serde_json::to_value(UpdateWorkspace::disconnect_vcs()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "vcs_repo_url": "", "vcs_branch": "" })
        );
    }

    #[test]
    fn login_omits_absent_totp() {
        let body = serde_json::to_value(LoginRequest {
            email: "a@b.c".into(),
            password: "pw".into(),
            totp_code: None,
        })
        .unwrap();
        assert!(body.get("totp_code").is_none());
    }

    #[test]
    fn workspace_lock_fields_decode() {
        let ws = fixtures::workspace("ws-1", true);
        assert!(ws.locked);
        assert_eq!(ws.execution_mode, ExecutionMode::Local);
        assert!(!ws.has_vcs());
    }

    #[test]
    fn operation_parses_cli_aliases() {
        assert_eq!("apply".parse::<RunOperation>(), Ok(RunOperation::PlanAndApply));
        assert!("build".parse::<RunOperation>().is_err());
        assert_eq!("viewer".parse::<OrgRole>(), Ok(OrgRole::Viewer));
    }

    #[test]
    fn execution_mode_is_sent_only_when_set() {
        let req = UpdateWorkspace {
            execution_mode: Some("agent".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({ "execution_mode": "agent" })
        );
        assert!(UpdateWorkspace::default().is_empty());
    }
}
