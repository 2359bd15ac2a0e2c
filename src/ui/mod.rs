//! Presentation layers for an export job: a modal terminal status window
//! running on its own thread, and a console fallback for headless runs.

pub mod headless;
pub mod status;
mod view;

use std::io;
use std::thread::{self, JoinHandle};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossbeam_channel::{Receiver, Sender};

use crate::error::ExportError;
use crate::export::{CancellationToken, ExportSummary, JobEvent};

pub use status::{Phase, StatusApp};

/// Handle to a status window running on the `export-status` thread.
///
/// The window owns the terminal until it is closed. The job reports
/// through [`StatusWindow::events`] and the final outcome is handed over
/// with [`StatusWindow::finish`].
pub struct StatusWindow {
    handle: JoinHandle<Result<()>>,
    decision: Receiver<bool>,
    pub events: Sender<JobEvent>,
}

impl StatusWindow {
    /// With `ask` unset the window skips the start prompt and
    /// [`StatusWindow::confirmed`] must not be called.
    pub fn spawn(
        title: String,
        element_count: usize,
        token: CancellationToken,
        ask: bool,
    ) -> io::Result<Self> {
        let (events, event_rx) = crossbeam_channel::unbounded();
        let (decision_tx, decision) = crossbeam_channel::bounded(1);

        let handle = thread::Builder::new()
            .name("export-status".to_string())
            .spawn(move || {
                let mut app = StatusApp::new(title, element_count, token, decision_tx);
                if !ask {
                    app = app.skip_confirmation();
                }
                let terminal = ratatui::init();
                let result = app.run(terminal, &event_rx);
                ratatui::restore();
                result
            })?;

        Ok(Self {
            handle,
            decision,
            events,
        })
    }

    /// Blocks until the user answers the start prompt. A window that
    /// closed without answering counts as a decline.
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.decision.recv().unwrap_or(false)
    }

    /// Sends the terminal event and waits for the user to close the window.
    pub fn finish(self, outcome: &Result<ExportSummary, ExportError>) -> Result<()> {
        let Self { handle, events, .. } = self;
        // The window may already be gone; then there is nobody to tell.
        let _ = events.send(JobEvent::from_outcome(outcome));
        drop(events);
        join(handle)
    }

    /// Waits for a window that was declined or never started a job.
    pub fn close(self) -> Result<()> {
        let Self { handle, events, .. } = self;
        drop(events);
        join(handle)
    }
}

fn join(handle: JoinHandle<Result<()>>) -> Result<()> {
    handle
        .join()
        .map_err(|_| eyre!("status window thread panicked"))?
}
