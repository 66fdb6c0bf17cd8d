//! Turns a [`RunSnapshot`] into styled lines. Nothing here touches the terminal; the lines
//! are handed to a [`Screen`](crate::tui::screen::Screen) in one piece.

use crate::app::{Annotation, Job, RunSnapshot, WorkflowRun};
use crate::tui::symbols::{self, Tone};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::time::Duration;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn symbol_span(symbol: &'static str, tone: Tone) -> Span<'static> {
    Span::styled(symbol, Style::default().fg(tone.color()))
}

/// Fixed block shown above every refresh.
pub fn refresh_header(interval: Duration, run_url: &str) -> Vec<Line<'static>> {
    vec![
        Line::styled(
            format!(
                "Refreshing run status every {} seconds. Press Ctrl+C to quit.",
                interval.as_secs()
            ),
            bold(),
        ),
        Line::default(),
        Line::styled(run_url.to_string(), bold()),
        Line::default(),
    ]
}

fn run_header(run: &WorkflowRun) -> Vec<Line<'static>> {
    let (symbol, tone) = symbols::status_symbol(run.status, run.conclusion);
    vec![
        Line::from(vec![
            symbol_span(symbol, tone),
            Span::raw(" "),
            Span::styled(run.name.clone(), bold()),
            Span::styled(format!(" · {}", run.id), Style::default().fg(Tone::Gray.color())),
        ]),
        Line::raw(format!("Triggered via {}", run.event)),
    ]
}

fn job_lines(job: &Job) -> Vec<Line<'static>> {
    let (symbol, tone) = symbols::status_symbol(job.status, job.conclusion);
    let elapsed = symbols::job_elapsed(job)
        .map(|e| format!(" in {e}"))
        .unwrap_or_default();
    let mut lines = vec![Line::from(vec![
        symbol_span(symbol, tone),
        Span::raw(format!(" {}{elapsed}", job.name)),
        Span::styled(format!(" (ID {})", job.id), Style::default().fg(Tone::Gray.color())),
    ])];
    for step in &job.steps {
        let (symbol, tone) = symbols::status_symbol(step.status, step.conclusion);
        lines.push(Line::from(vec![
            Span::raw("  "),
            symbol_span(symbol, tone),
            Span::raw(format!(" {}", step.name)),
        ]));
    }
    lines
}

fn annotation_lines(annotation: &Annotation) -> Vec<Line<'static>> {
    let (symbol, tone) = symbols::annotation_symbol(annotation.level);
    vec![
        Line::from(vec![
            symbol_span(symbol, tone),
            Span::raw(format!(" {}", annotation.message)),
        ]),
        Line::styled(
            format!(
                "{}: {}#{}",
                annotation.job_name, annotation.path, annotation.start_line
            ),
            Style::default().fg(Tone::Gray.color()),
        ),
    ]
}

/// Run header, jobs with their steps, and annotations when there are any.
pub fn snapshot_lines(snapshot: &RunSnapshot) -> Vec<Line<'static>> {
    let mut lines = run_header(&snapshot.run);
    lines.push(Line::default());
    if snapshot.jobs.is_empty() {
        return lines;
    }

    lines.push(Line::styled("JOBS", bold()));
    for job in &snapshot.jobs {
        lines.extend(job_lines(job));
    }

    if !snapshot.annotations.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled("ANNOTATIONS", bold()));
        for (i, annotation) in snapshot.annotations.iter().enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            lines.extend(annotation_lines(annotation));
        }
    }
    lines
}

/// Final one-liner printed on the normal screen once the run is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub symbol: &'static str,
    pub tone: Tone,
    pub name: String,
    pub id: u64,
    pub conclusion: String,
}

impl Summary {
    pub fn from_run(run: &WorkflowRun) -> Self {
        let (symbol, tone) = symbols::status_symbol(run.status, run.conclusion);
        Self {
            symbol,
            tone,
            name: run.name.clone(),
            id: run.id,
            conclusion: run
                .conclusion
                .map_or_else(String::new, |c| c.as_str().to_string()),
        }
    }

    pub fn plain(&self) -> String {
        format!(
            "{} {} ({}) completed with '{}'",
            self.symbol, self.name, self.id, self.conclusion
        )
    }
}

pub fn plain_line(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

pub fn plain_text(lines: &[Line<'_>]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&plain_line(line));
        out.push('\n');
    }
    out
}
