//! Text rendering for line-oriented (non-TUI) output.
//!
//! Builds pre-formatted lines; callers decide where they go.

use crate::model::{
    format_timestamp, OrgMember, Organization, Project, Run, StateVersion, TfVersion, Variable,
    Workspace,
};
use crate::orchestrator::{RunDetail, RunRow};
use crate::status::StatusMeta;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn status_badge(meta: &StatusMeta) -> String {
    format!("{} {}", meta.icon, meta.label)
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

/// Header, counters and timeline of a run.
pub(crate) fn run_lines(run: &Run) -> Vec<String> {
    let mut lines = vec![
        run.operation.title().to_string(),
        format!("Run:       {}", run.id),
        format!("Status:    {}", status_badge(&run.status.meta())),
        format!("Workspace: {}", run.workspace_id),
    ];
    if !run.message.is_empty() {
        lines.push(format!("Message:   {}", run.message));
    }
    lines.push(format!("Creator:   {}", run.creator_name()));
    lines.push(format!(
        "Changes:   +{} to add, ~{} to change, -{} to destroy",
        run.resources_added, run.resources_changed, run.resources_deleted
    ));
    lines.push(format!(
        "Terraform: {}   Auto-apply: {}",
        or_dash(&run.terraform_version),
        if run.auto_apply { "yes" } else { "no" }
    ));
    lines.push("Timeline:".to_string());
    for (phase, at) in run.timeline() {
        lines.push(format!("  {:<10} {}", phase.label(), format_timestamp(at)));
    }
    lines
}

/// Run plus both output sections and the actions currently offered.
pub(crate) fn build_run_detail(detail: &RunDetail) -> TextSummary {
    let mut lines = run_lines(&detail.run);
    let actions = detail.available_actions();
    if !actions.is_empty() {
        let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
        lines.push(format!("Actions:   {}", names.join(", ")));
    }
    lines.push(String::new());
    lines.push("== Plan output ==".to_string());
    lines.extend(detail.plan_log.text().lines().map(str::to_string));
    lines.push(String::new());
    lines.push("== Apply output ==".to_string());
    lines.extend(detail.apply_log.text().lines().map(str::to_string));
    TextSummary { lines }
}

/// Column-aligned table. Width is measured in chars.
pub(crate) fn table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let mut out = vec![render_row(headers.iter().copied(), &widths)];
    out.extend(rows.iter().map(|r| render_row(r.iter().map(String::as_str), &widths)));
    out
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(c, w)| {
            let pad = w.saturating_sub(c.chars().count());
            format!("{c}{}", " ".repeat(pad))
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

pub(crate) fn build_run_rows(rows: &[RunRow]) -> TextSummary {
    if rows.is_empty() {
        return TextSummary {
            lines: vec!["No runs yet".to_string()],
        };
    }
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let deltas: Vec<String> = r.deltas.iter().map(ToString::to_string).collect();
            vec![
                r.id.clone(),
                format!("{} {}", r.meta.icon, r.meta.short_label),
                r.title.to_string(),
                deltas.join(" "),
                format!("{} · {}", r.message, r.creator),
                format_timestamp(r.created_at),
            ]
        })
        .collect();
    TextSummary {
        lines: table(
            &["ID", "STATUS", "OPERATION", "CHANGES", "MESSAGE", "CREATED"],
            &body,
        ),
    }
}

pub(crate) fn build_organizations(orgs: &[Organization]) -> TextSummary {
    let body: Vec<Vec<String>> = orgs
        .iter()
        .map(|o| {
            vec![
                o.id.clone(),
                o.name.clone(),
                or_dash(&o.display_name).to_string(),
                or_dash(&o.email).to_string(),
            ]
        })
        .collect();
    TextSummary {
        lines: table(&["ID", "NAME", "DISPLAY NAME", "EMAIL"], &body),
    }
}

pub(crate) fn build_members(members: &[OrgMember]) -> TextSummary {
    let body: Vec<Vec<String>> = members
        .iter()
        .map(|m| {
            let (name, email) = m
                .user
                .as_ref()
                .map(|u| (u.username.clone(), u.email.clone()))
                .unwrap_or_else(|| (m.user_id.clone(), String::new()));
            vec![m.id.clone(), name, or_dash(&email).to_string(), m.role.as_str().to_string()]
        })
        .collect();
    TextSummary {
        lines: table(&["ID", "USER", "EMAIL", "ROLE"], &body),
    }
}

pub(crate) fn build_projects(projects: &[Project]) -> TextSummary {
    let body: Vec<Vec<String>> = projects
        .iter()
        .map(|p| vec![p.id.clone(), p.name.clone(), or_dash(&p.description).to_string()])
        .collect();
    TextSummary {
        lines: table(&["ID", "NAME", "DESCRIPTION"], &body),
    }
}

pub(crate) fn build_workspaces(workspaces: &[Workspace]) -> TextSummary {
    let body: Vec<Vec<String>> = workspaces
        .iter()
        .map(|w| {
            vec![
                w.id.clone(),
                w.name.clone(),
                or_dash(&w.terraform_version).to_string(),
                if w.locked { "🔒 locked" } else { "" }.to_string(),
                if w.has_vcs() {
                    format!("{}@{}", w.vcs_repo_url, w.vcs_branch)
                } else {
                    String::new()
                },
            ]
        })
        .collect();
    TextSummary {
        lines: table(&["ID", "NAME", "TERRAFORM", "LOCK", "VCS"], &body),
    }
}

pub(crate) fn build_workspace(ws: &Workspace) -> TextSummary {
    let mut lines = vec![
        format!("Workspace: {} ({})", ws.name, ws.id),
        format!("Project:   {}", ws.project_id),
        format!("Terraform: {}", or_dash(&ws.terraform_version)),
        format!("Directory: {}", or_dash(&ws.working_directory)),
        format!("Auto-apply: {}", if ws.auto_apply { "yes" } else { "no" }),
        format!("Execution: {}", ws.execution_mode.as_str()),
    ];
    if !ws.description.is_empty() {
        lines.push(format!("Description: {}", ws.description));
    }
    if ws.locked {
        let by = ws.locked_by.as_deref().unwrap_or("unknown");
        lines.push(format!("🔒 Locked by {by}"));
    }
    if ws.has_vcs() {
        lines.push(format!("VCS: {} ({})", ws.vcs_repo_url, or_dash(&ws.vcs_branch)));
    }
    TextSummary { lines }
}

pub(crate) fn build_variables(vars: &[Variable]) -> TextSummary {
    let body: Vec<Vec<String>> = vars
        .iter()
        .map(|v| {
            let mut flags = Vec::new();
            if v.hcl {
                flags.push("hcl");
            }
            if v.sensitive {
                flags.push("sensitive");
            }
            vec![
                v.id.clone(),
                v.key.clone(),
                v.value.clone(),
                v.category.as_str().to_string(),
                flags.join(","),
            ]
        })
        .collect();
    TextSummary {
        lines: table(&["ID", "KEY", "VALUE", "CATEGORY", "FLAGS"], &body),
    }
}

pub(crate) fn build_state_versions(versions: &[StateVersion]) -> TextSummary {
    let body: Vec<Vec<String>> = versions
        .iter()
        .map(|v| {
            vec![
                v.id.clone(),
                format!("#{}", v.serial),
                v.resource_count.to_string(),
                v.run_id.clone().unwrap_or_else(|| "-".into()),
                format_timestamp(v.created_at),
            ]
        })
        .collect();
    TextSummary {
        lines: table(&["ID", "SERIAL", "RESOURCES", "RUN", "CREATED"], &body),
    }
}

pub(crate) fn build_tf_versions(versions: &[TfVersion]) -> TextSummary {
    let lines = versions
        .iter()
        .map(|v| {
            if v.installed {
                format!("{}  (installed)", v.version)
            } else {
                v.version.clone()
            }
        })
        .collect();
    TextSummary { lines }
}
