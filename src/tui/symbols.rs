use crate::app::{AnnotationLevel, Conclusion, Job, RunStatus};
use ratatui::style::Color;

/// Colour family of a status symbol, convertible for both the ratatui frame and the plain
/// crossterm summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Green,
    Red,
    Yellow,
    Gray,
}

impl Tone {
    pub fn color(self) -> Color {
        match self {
            Tone::Green => Color::Green,
            Tone::Red => Color::Red,
            Tone::Yellow => Color::Yellow,
            Tone::Gray => Color::DarkGray,
        }
    }

    pub fn term_color(self) -> crossterm::style::Color {
        match self {
            Tone::Green => crossterm::style::Color::Green,
            Tone::Red => crossterm::style::Color::Red,
            Tone::Yellow => crossterm::style::Color::Yellow,
            Tone::Gray => crossterm::style::Color::DarkGrey,
        }
    }
}

pub fn status_symbol(status: RunStatus, conclusion: Option<Conclusion>) -> (&'static str, Tone) {
    match (status, conclusion) {
        (RunStatus::Completed, Some(Conclusion::Success)) => ("✓", Tone::Green),
        (
            RunStatus::Completed,
            Some(Conclusion::Skipped | Conclusion::Cancelled | Conclusion::Neutral),
        ) => ("-", Tone::Gray),
        (RunStatus::Completed, _) => ("X", Tone::Red),
        _ => ("*", Tone::Yellow),
    }
}

pub fn annotation_symbol(level: AnnotationLevel) -> (&'static str, Tone) {
    match level {
        AnnotationLevel::Failure => ("X", Tone::Red),
        AnnotationLevel::Warning => ("!", Tone::Yellow),
        AnnotationLevel::Notice | AnnotationLevel::Unknown => ("-", Tone::Gray),
    }
}

/// Compact duration as the gh CLI prints it: `45s`, `1m59s`, `1h2m3s`.
pub fn format_elapsed(secs: i64) -> String {
    let secs = secs.max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}

/// Wall time of a finished job. `None` while the job has no completion time.
pub fn job_elapsed(job: &Job) -> Option<String> {
    let (start, end) = (job.started_at?, job.completed_at?);
    let secs = end.signed_duration_since(start).num_seconds();
    (secs >= 0).then(|| format_elapsed(secs))
}
