//! Periodic terminal view of the registry.
//!
//! A background task reads [`Registry::snapshot`] on a fixed interval and
//! renders one `indicatif` line per job. It only reads; nothing here can
//! change a job.
//!
//! Log output shares the terminal with the board through [`BoardLogWriter`],
//! which hides the bars while a line is printed.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing_subscriber::fmt::MakeWriter;

use crate::job::{JobId, JobStatus, JobView};
use crate::registry::Registry;

/// Default refresh interval of the status board.
pub const DEFAULT_DISPLAY_INTERVAL: Duration = Duration::from_millis(200);

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How a row is currently drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Bar,
    Spinner,
    Done,
}

#[derive(Debug)]
struct Row {
    bar: ProgressBar,
    kind: Option<RowKind>,
}

/// Live table of every job, one line each.
#[derive(Debug)]
pub struct StatusBoard {
    multi: MultiProgress,
    rows: HashMap<JobId, Row>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    /// Creates a board drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// Creates a board drawing to `target`.
    #[must_use]
    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self::from_multi(MultiProgress::with_draw_target(target))
    }

    /// Creates a board on an existing `MultiProgress`, e.g. one shared with
    /// a [`BoardLogWriter`].
    #[must_use]
    pub fn from_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            rows: HashMap::new(),
        }
    }

    /// Number of rows drawn so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true before the first job appears.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Brings every row in line with `views`. Rows for new jobs are appended.
    pub fn render(&mut self, views: &[JobView]) {
        for view in views {
            let multi = &self.multi;
            let row = self.rows.entry(view.id).or_insert_with(|| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_prefix(format!("#{}", view.id));
                Row { bar, kind: None }
            });
            update_row(row, view);
        }
    }

    /// Finishes every row that is still live, leaving it on screen.
    pub fn finish(&mut self) {
        for row in self.rows.values() {
            if !row.bar.is_finished() {
                row.bar.abandon();
            }
        }
    }
}

fn update_row(row: &mut Row, view: &JobView) {
    if row.kind == Some(RowKind::Done) {
        return;
    }

    let message = format_row(view);
    match view.status {
        JobStatus::Completed => {
            row.bar.set_style(plain_style());
            row.bar.finish_with_message(message);
            row.kind = Some(RowKind::Done);
        }
        JobStatus::Failed => {
            row.bar.set_style(plain_style());
            row.bar.abandon_with_message(message);
            row.kind = Some(RowKind::Done);
        }
        JobStatus::Created | JobStatus::Fetching if view.size_known => {
            if row.kind != Some(RowKind::Bar) {
                row.bar.set_style(bar_style());
                row.kind = Some(RowKind::Bar);
            }
            row.bar.set_position(u64::from(view.progress));
            row.bar.set_message(message);
        }
        JobStatus::Created | JobStatus::Fetching => {
            if row.kind != Some(RowKind::Spinner) {
                row.bar.set_style(spinner_style());
                row.kind = Some(RowKind::Spinner);
            }
            row.bar.set_message(message);
            row.bar.tick();
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>4} [{bar:30}] {msg}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>4} {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn plain_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>4} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// One human-readable line for a job.
///
/// Columns: URL, name, started, finished, size, progress, done. Progress
/// reads `-` while the total size is unknown; a failed job shows its error.
#[must_use]
pub fn format_row(view: &JobView) -> String {
    let name = if view.name.is_empty() { "-" } else { &view.name };
    let finished = view
        .finished_at
        .as_ref()
        .map_or_else(|| "-".to_string(), format_time);
    let progress = if view.size_known {
        format!("{}%", view.progress)
    } else {
        "-".to_string()
    };

    let mut line = format!(
        "{} | {} | {} | {} | {}MB | {} | {}",
        view.url,
        name,
        format_time(&view.started_at),
        finished,
        view.size_mb,
        progress,
        view.is_done
    );
    if let Some(error) = &view.error {
        line.push_str(" | ");
        line.push_str(error);
    }
    line
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// `tracing_subscriber` writer that prints to stderr without tearing the board.
///
/// Each event is buffered and written inside [`MultiProgress::suspend`], so
/// the bars are cleared first and redrawn below the new line.
#[derive(Debug, Clone)]
pub struct BoardLogWriter {
    multi: MultiProgress,
}

impl BoardLogWriter {
    /// Writes log lines around the bars of `multi`.
    #[must_use]
    pub fn new(multi: MultiProgress) -> Self {
        Self { multi }
    }
}

impl<'a> MakeWriter<'a> for BoardLogWriter {
    type Writer = SuspendedStderr;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendedStderr {
            multi: self.multi.clone(),
            buf: Vec::new(),
        }
    }
}

/// One event's output, flushed to stderr on drop.
#[derive(Debug)]
pub struct SuspendedStderr {
    multi: MultiProgress,
    buf: Vec<u8>,
}

impl Write for SuspendedStderr {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let buf = std::mem::take(&mut self.buf);
        self.multi.suspend(|| io::stderr().write_all(&buf))
    }
}

impl Drop for SuspendedStderr {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Spawns the status board refresh loop on `multi`.
///
/// Returns (handle, stop): set `stop` and await the handle to end the loop.
/// When `enabled` is false, returns (None, stop) with stop already true.
pub fn spawn_status_board(
    enabled: bool,
    multi: MultiProgress,
    registry: Arc<Registry>,
    interval: Duration,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !enabled {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_board_inner(multi, registry, interval, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_board_inner(
    multi: MultiProgress,
    registry: Arc<Registry>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut board = StatusBoard::from_multi(multi);
        while !stop.load(Ordering::SeqCst) {
            board.render(&registry.snapshot());
            tokio::time::sleep(interval).await;
        }
        board.render(&registry.snapshot());
        board.finish();
    })
}
