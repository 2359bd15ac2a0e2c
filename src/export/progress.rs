//! Progress reporting and cooperative cancellation for export jobs.
//!
//! The job never talks to a UI directly. It reports `(percent, message)`
//! pairs to a [`ProgressSink`] and polls a [`CancellationToken`] once per
//! element. Presentation layers subscribe through a channel of
//! [`JobEvent`]s or implement the sink themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use super::ExportSummary;
use crate::error::ExportError;

/// Elements processed between two progress reports.
pub const REPORT_INTERVAL: usize = 100;

/// Shared flag flipped once by whoever wants the job to stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Errors with [`ExportError::Cancelled`] once the token has been cancelled.
    pub fn check(&self) -> Result<(), ExportError> {
        if self.is_cancelled() {
            Err(ExportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Receives progress updates from a running job.
pub trait ProgressSink {
    fn report(&self, percent: u8, message: &str);
}

/// Discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Everything a presentation layer hears about a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress { percent: u8, message: String },
    Completed(ExportSummary),
    Cancelled,
    Failed(String),
}

impl JobEvent {
    /// Terminal event for a finished run.
    #[must_use]
    pub fn from_outcome(outcome: &Result<ExportSummary, ExportError>) -> Self {
        match outcome {
            Ok(summary) => Self::Completed(summary.clone()),
            Err(ExportError::Cancelled) => Self::Cancelled,
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

impl ProgressSink for Sender<JobEvent> {
    fn report(&self, percent: u8, message: &str) {
        // A closed receiver means nobody is watching any more.
        let _ = self.send(JobEvent::Progress {
            percent,
            message: message.to_string(),
        });
    }
}

/// The two scans of an export run and their share of the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    CollectDefinitions,
    WriteData,
}

impl Pass {
    fn offset(self) -> usize {
        match self {
            Pass::CollectDefinitions => 0,
            Pass::WriteData => 50,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Pass::CollectDefinitions => "Collecting definitions",
            Pass::WriteData => "Writing data",
        }
    }

    /// `offset + min(50, floor(count / total * 50))`.
    #[must_use]
    pub fn percent(self, count: usize, total: usize) -> u8 {
        let share = if total == 0 {
            0
        } else {
            (count.saturating_mul(50) / total).min(50)
        };
        (self.offset() + share) as u8
    }
}

/// Per-element checkpoint shared by both passes: cancellation first, then
/// a report every [`REPORT_INTERVAL`] elements. Percent never goes down.
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    token: &'a CancellationToken,
    last_percent: u8,
}

impl<'a> ProgressReporter<'a> {
    #[must_use]
    pub fn new(sink: &'a dyn ProgressSink, token: &'a CancellationToken) -> Self {
        Self {
            sink,
            token,
            last_percent: 0,
        }
    }

    /// Call before processing element `count` (0-based) of `total`.
    pub fn checkpoint(&mut self, pass: Pass, count: usize, total: usize) -> Result<(), ExportError> {
        self.token.check()?;
        if count % REPORT_INTERVAL == 0 {
            let message = format!("{} [{count}/{total}]", pass.label());
            self.report(pass.percent(count, total), &message);
        }
        Ok(())
    }

    pub fn report(&mut self, percent: u8, message: &str) {
        let percent = percent.clamp(self.last_percent, 100);
        self.last_percent = percent;
        tracing::debug!(percent, status = message, "progress");
        self.sink.report(percent, message);
    }

    #[must_use]
    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<(u8, String)>>);

    impl ProgressSink for Recorder {
        fn report(&self, percent: u8, message: &str) {
            self.0.borrow_mut().push((percent, message.to_string()));
        }
    }

    #[test]
    fn percent_is_split_between_passes() {
        assert_eq!(Pass::CollectDefinitions.percent(0, 250), 0);
        assert_eq!(Pass::CollectDefinitions.percent(100, 250), 20);
        assert_eq!(Pass::CollectDefinitions.percent(250, 250), 50);
        assert_eq!(Pass::WriteData.percent(0, 250), 50);
        assert_eq!(Pass::WriteData.percent(200, 250), 90);
        assert_eq!(Pass::WriteData.percent(0, 0), 50);
    }

    #[test]
    fn reports_every_hundred_elements() {
        let recorder = Recorder::default();
        let token = CancellationToken::new();
        let mut reporter = ProgressReporter::new(&recorder, &token);

        for count in 0..250 {
            reporter.checkpoint(Pass::CollectDefinitions, count, 250).unwrap();
        }

        assert_eq!(
            recorder.0.into_inner(),
            vec![
                (0, "Collecting definitions [0/250]".to_string()),
                (20, "Collecting definitions [100/250]".to_string()),
                (40, "Collecting definitions [200/250]".to_string()),
            ]
        );
    }

    #[test]
    fn cancelled_token_stops_checkpoint() {
        let token = CancellationToken::new();
        let mut reporter = ProgressReporter::new(&NullSink, &token);

        token.clone().cancel();
        let err = reporter.checkpoint(Pass::WriteData, 5, 10).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn reported_percent_never_decreases() {
        let recorder = Recorder::default();
        let token = CancellationToken::new();
        let mut reporter = ProgressReporter::new(&recorder, &token);

        reporter.report(60, "a");
        reporter.report(40, "b");

        assert_eq!(reporter.last_percent(), 60);
        assert_eq!(recorder.0.borrow()[1].0, 60);
    }

    #[test]
    fn channel_sink_forwards_progress_events() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.report(10, "hello");

        assert_eq!(
            rx.try_recv().unwrap(),
            JobEvent::Progress {
                percent: 10,
                message: "hello".to_string()
            }
        );
    }
}
