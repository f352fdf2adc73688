use std::io::{self, Write};

use gridcast_core::{
    AppViewModel, Icon, JobId, NotificationView, RecentProjects, StatusUpdate, ToastLevel,
};

use crate::platform::effects::Notice;

const BAR_WIDTH: usize = 20;

/// Writes the notification list with its badge count.
pub fn render(out: &mut impl Write, view: &AppViewModel) -> io::Result<()> {
    writeln!(out, "Notifications ({})", view.badge_count)?;
    for row in &view.notifications {
        writeln!(out, "  {}", format_row(row))?;
    }
    if view.pending_submissions > 0 {
        writeln!(
            out,
            "  {} submission(s) waiting for the server",
            view.pending_submissions
        )?;
    }
    for error in &view.field_errors {
        writeln!(out, "  ! {}: {}", error.field, error.message)?;
    }
    out.flush()
}

pub fn notice(out: &mut impl Write, notice: &Notice) -> io::Result<()> {
    match notice {
        Notice::Toast(toast) => writeln!(out, "{} {}", toast_prefix(toast.level), toast.text)?,
        Notice::Result {
            job_id,
            feature,
            result,
        } => {
            let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
            writeln!(out, "Result of {} job {}:", feature.label(), job_id)?;
            writeln!(out, "{pretty}")?;
        }
        Notice::ProjectRecorded { name, path } => {
            writeln!(out, "Added {name} ({path}) to recent projects")?
        }
    }
    out.flush()
}

pub fn status(out: &mut impl Write, job_id: &JobId, update: &StatusUpdate) -> io::Result<()> {
    let mut line = format!("{job_id}: {}", update.status.label());
    if let Some(progress) = update.progress {
        line.push_str(&format!(" {:.0}%", progress.clamp(0.0, 100.0)));
    }
    if let Some(stage) = update.stage.as_ref().or(update.current_sector.as_ref()) {
        line.push_str(&format!(" ({stage})"));
    }
    if let Some(message) = update.message.as_deref().filter(|m| !m.is_empty()) {
        line.push_str(" - ");
        line.push_str(message);
    }
    writeln!(out, "{line}")?;
    if let Some(result) = &update.result {
        writeln!(out, "{}", serde_json::to_string_pretty(result).unwrap_or_default())?;
    }
    Ok(())
}

pub fn recent_projects(out: &mut impl Write, recent: &RecentProjects) -> io::Result<()> {
    if recent.is_empty() {
        return writeln!(out, "No recent projects");
    }
    for (index, entry) in recent.entries().iter().enumerate() {
        writeln!(
            out,
            "{}. {}  {}  (opened {})",
            index + 1,
            entry.name,
            entry.path,
            entry.last_opened
        )?;
    }
    Ok(())
}

fn format_row(row: &NotificationView) -> String {
    let mut line = format!(
        "{} [{}] {} {} {:>3}% {}",
        icon_glyph(row.icon),
        row.tone.class_name(),
        row.name,
        progress_bar(row.progress),
        row.progress,
        row.status.label()
    );
    if let Some(stage) = &row.stage {
        line.push_str(&format!(" ({stage})"));
    }
    if !row.message.is_empty() {
        line.push_str(" - ");
        line.push_str(&row.message);
    }
    if row.cancel_requested {
        line.push_str(" [cancelling]");
    } else if row.shows_cancel {
        line.push_str(" [Ctrl-C to cancel]");
    }
    if let Some(issue) = &row.connection_issue {
        line.push_str(&format!(" [retrying: {issue}]"));
    }
    line
}

fn progress_bar(progress: u8) -> String {
    let filled = (usize::from(progress.min(100)) * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn icon_glyph(icon: Icon) -> &'static str {
    match icon {
        Icon::Hourglass => "..",
        Icon::Spinner => "~>",
        Icon::Check => "ok",
        Icon::Cross => "xx",
        Icon::Ban => "--",
    }
}

fn toast_prefix(level: ToastLevel) -> &'static str {
    match level {
        ToastLevel::Info => "[i]",
        ToastLevel::Success => "[+]",
        ToastLevel::Warning => "[!]",
        ToastLevel::Error => "[x]",
    }
}
