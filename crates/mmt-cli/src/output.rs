//! Output helpers shared by the command handlers.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use mmt_cluster::tuning::{TuningBanner, TuningReporter, TuningResult, TuningStage};
use tracing::warn;

/// Output handle over the command's stdout and stderr writers.
pub(crate) struct CommandOutput<W: Write, E: Write> {
    pub(crate) stdout: W,
    pub(crate) stderr: E,
}

impl<W: Write, E: Write> CommandOutput<W, E> {
    pub(crate) const fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    pub(crate) fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.stdout.write_fmt(args)?;
        self.stdout.write_all(b"\n")?;
        self.stdout.flush()
    }

    pub(crate) fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.stderr.write_fmt(args)?;
        self.stderr.write_all(b"\n")?;
        self.stderr.flush()
    }
}

const STAGE_COLUMN_WIDTH: usize = 70;

/// Prints tuning progress for a person watching the terminal.
///
/// Each stage occupies one line: the description is written when the stage
/// begins and the outcome is appended when it ends.
pub(crate) struct ConsoleTuningReporter<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> ConsoleTuningReporter<W> {
    pub(crate) const fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    fn emit(&self, args: fmt::Arguments<'_>) {
        let mut out = self.out.borrow_mut();
        if let Err(error) = out.write_fmt(args).and_then(|()| out.flush()) {
            warn!(%error, "failed to write tuning progress");
        }
    }
}

#[expect(clippy::float_arithmetic, reason = "BLEU is reported as a percentage")]
fn bleu_percent(bleu: f64) -> f64 {
    bleu * 100.0
}

impl<W: Write> TuningReporter for ConsoleTuningReporter<W> {
    fn started(&self, banner: &TuningBanner) {
        self.emit(format_args!("\n============ TUNING STARTED ============\n"));
        self.emit(format_args!("ENGINE:  {}\n", banner.engine));
        match &banner.corpora_dir {
            Some(dir) => self.emit(format_args!(
                "CORPORA: {dir} ({} documents)\n",
                banner.corpus_count
            )),
            None => self.emit(format_args!("CORPORA: {} documents\n", banner.corpus_count)),
        }
        self.emit(format_args!("LANGS:   {}\n\n", banner.languages));
    }

    fn stage_started(&self, stage: TuningStage) {
        let label = format!(
            "INFO: ({} of {}) {stage}... ",
            stage.position(),
            TuningStage::total()
        );
        self.emit(format_args!("{label:<STAGE_COLUMN_WIDTH$}"));
    }

    fn stage_finished(&self, _stage: TuningStage, elapsed: Duration) {
        self.emit(format_args!("DONE (in {}s)\n", elapsed.as_secs()));
    }

    fn stage_failed(&self, _stage: TuningStage, _elapsed: Duration) {
        self.emit(format_args!("FAILED\n"));
    }

    fn completed(&self, banner: &TuningBanner, result: &TuningResult) {
        self.emit(format_args!("\n============ TUNING SUCCESS ============\n"));
        self.emit(format_args!("\nFinal BLEU: {:.2}\n\n", bleu_percent(result.bleu)));
        self.emit(format_args!(
            "You can try the API with:\n\tcurl \"http://localhost:{}/translate?q=hello+world&context=computer\" | python -mjson.tool\n\n",
            banner.api_port
        ));
    }
}
