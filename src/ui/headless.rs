use std::io::{self, BufRead, Write};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::ExportError;
use crate::export::{CancellationToken, ExportJob, ExportSummary, ProgressSink};
use crate::model::Element;

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

impl ProgressSink for ProgressBar {
    fn report(&self, percent: u8, message: &str) {
        self.set_position(u64::from(percent));
        self.set_message(message.to_string());
    }
}

/// Yes/Cancel on the console. Anything but `y`/`yes` declines.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    element_count: usize,
) -> io::Result<bool> {
    write!(
        output,
        "Do you want to export all the elements in this model? ({element_count} elements) [y/N] "
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Routes Ctrl-C to `token`, so an interrupted run ends through the
/// cancellation path and removes its partial file. Only one handler can be
/// installed per process.
pub fn cancel_on_interrupt(token: &CancellationToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, cancelling export");
        token.cancel();
    })
}

#[must_use]
pub fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

/// Runs the job with a console progress bar in place of the status window.
pub fn run_with_progress_bar(
    job: &ExportJob,
    elements: &[Element],
) -> Result<ExportSummary, ExportError> {
    let bar = progress_bar();
    let outcome = job.run(elements, &bar);
    match &outcome {
        Ok(_) => bar.finish(),
        Err(_) => bar.abandon(),
    }
    outcome
}
