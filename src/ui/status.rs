use std::path::PathBuf;
use std::time::Duration;

use color_eyre::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};

use crate::config::DEFAULT_COPY_FILENAME;
use crate::export::{copy_export, CancellationToken, ExportSummary, JobEvent};

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Yes/Cancel before anything runs.
    Confirm,
    Running,
    /// User asked to stop; waiting for a yes/no.
    ConfirmCancel,
    /// Cancellation requested, waiting for the job to notice.
    Cancelling,
    Cancelled,
    Completed,
    SavePrompt { input: String },
    SaveFailed { destination: PathBuf, error: String },
    Failed(String),
}

/// State of the modal status window. Key handling and job events are
/// plain state transitions so they can be driven without a terminal.
pub struct StatusApp {
    pub title: String,
    pub element_count: usize,
    pub phase: Phase,
    pub percent: u8,
    pub message: String,
    pub summary: Option<ExportSummary>,
    pub should_quit: bool,
    token: CancellationToken,
    decision: Option<Sender<bool>>,
}

impl StatusApp {
    #[must_use]
    pub fn new(
        title: String,
        element_count: usize,
        token: CancellationToken,
        decision: Sender<bool>,
    ) -> Self {
        Self {
            title,
            element_count,
            phase: Phase::Confirm,
            percent: 0,
            message: String::new(),
            summary: None,
            should_quit: false,
            token,
            decision: Some(decision),
        }
    }

    /// Starts in the running phase, for runs confirmed up front.
    #[must_use]
    pub fn skip_confirmation(mut self) -> Self {
        self.decide(true);
        self.phase = Phase::Running;
        self
    }

    pub fn run(mut self, mut terminal: DefaultTerminal, events: &Receiver<JobEvent>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.drain_events(events);

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        super::view::draw_status(frame, self);
    }

    /// Applies everything the job has sent so far.
    pub fn drain_events(&mut self, events: &Receiver<JobEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if matches!(
                        self.phase,
                        Phase::Running | Phase::ConfirmCancel | Phase::Cancelling
                    ) {
                        self.phase = Phase::Failed("export stopped unexpectedly".to_string());
                    }
                    break;
                }
            }
        }
    }

    pub fn apply(&mut self, event: JobEvent) {
        match event {
            JobEvent::Progress { percent, message } => {
                self.percent = percent;
                self.message = message;
            }
            JobEvent::Completed(summary) => {
                self.percent = 100;
                self.message = format!("Export ready at: {}", summary.path.display());
                self.summary = Some(summary);
                self.phase = Phase::Completed;
            }
            JobEvent::Cancelled => {
                self.phase = Phase::Cancelled;
                self.message = "Export cancelled".to_string();
            }
            JobEvent::Failed(error) => self.phase = Phase::Failed(error),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match &mut self.phase {
            Phase::Confirm => match code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.decide(true);
                    self.phase = Phase::Running;
                    self.message = "Starting export".to_string();
                }
                KeyCode::Char('n' | 'c' | 'q') | KeyCode::Esc => {
                    self.decide(false);
                    self.should_quit = true;
                }
                _ => {}
            },
            Phase::Running => {
                if matches!(code, KeyCode::Char('c' | 'q') | KeyCode::Esc) {
                    self.phase = Phase::ConfirmCancel;
                }
            }
            Phase::ConfirmCancel => match code {
                KeyCode::Char('y') => {
                    self.token.cancel();
                    self.phase = Phase::Cancelling;
                    self.message = "Cancelling".to_string();
                }
                KeyCode::Char('n') | KeyCode::Esc => self.phase = Phase::Running,
                _ => {}
            },
            Phase::Cancelling => {}
            Phase::Cancelled => self.should_quit = true,
            Phase::Completed => match code {
                KeyCode::Char('s') => {
                    self.phase = Phase::SavePrompt {
                        input: DEFAULT_COPY_FILENAME.to_string(),
                    };
                }
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => self.should_quit = true,
                _ => {}
            },
            Phase::SavePrompt { input } => match code {
                KeyCode::Char(c) => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Enter if !input.trim().is_empty() => {
                    let destination = PathBuf::from(input.trim());
                    self.save_copy(destination);
                }
                KeyCode::Esc => self.phase = Phase::Completed,
                _ => {}
            },
            Phase::SaveFailed { destination, .. } => match code {
                KeyCode::Char('r') | KeyCode::Enter => {
                    let destination = destination.clone();
                    self.save_copy(destination);
                }
                KeyCode::Char('c') | KeyCode::Esc => self.phase = Phase::Completed,
                _ => {}
            },
            Phase::Failed(_) => self.should_quit = true,
        }
    }

    fn decide(&mut self, confirmed: bool) {
        if let Some(decision) = self.decision.take() {
            let _ = decision.send(confirmed);
        }
    }

    fn save_copy(&mut self, destination: PathBuf) {
        let Some(summary) = &self.summary else {
            return;
        };
        match copy_export(&summary.path, &destination) {
            Ok(_) => {
                self.message = format!("Export saved at: {}", destination.display());
                self.phase = Phase::Completed;
            }
            Err(err) => {
                self.phase = Phase::SaveFailed {
                    destination,
                    error: err.to_string(),
                };
            }
        }
    }
}
