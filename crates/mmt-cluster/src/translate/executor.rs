use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use super::TRANSLATE_TARGET;
use super::errors::TranslateError;
use super::session::TranslationSession;
use crate::api::{ApiError, NBestEntry, Translation};

/// Worker count of the batch pool.
pub const DEFAULT_BATCH_WORKERS: usize = 100;

const CONNECTION_ERROR: &str =
    "CONNECTION ERROR: unable to connect MMT server, try starting it with \"./mmt start\"";

/// Destinations of translations and n-best lists.
pub struct ExecutorOutput<'w> {
    translations: &'w mut dyn Write,
    nbest: Option<&'w mut dyn Write>,
}

impl<'w> ExecutorOutput<'w> {
    /// Writes n-best lists interleaved with translations.
    pub fn new(translations: &'w mut dyn Write) -> Self {
        Self {
            translations,
            nbest: None,
        }
    }

    /// Sends n-best lists to a separate writer.
    #[must_use]
    pub fn with_nbest(mut self, nbest: &'w mut dyn Write) -> Self {
        self.nbest = Some(nbest);
        self
    }

    fn translation(&mut self, text: &str) -> Result<(), TranslateError> {
        writeln!(self.translations, "{text}")?;
        Ok(())
    }

    fn nbest_line(&mut self, line: &str) -> Result<(), TranslateError> {
        match self.nbest.as_mut() {
            Some(writer) => writeln!(writer, "{line}")?,
            None => writeln!(self.translations, "{line}")?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TranslateError> {
        self.translations.flush()?;
        if let Some(writer) = self.nbest.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Formats one n-best hypothesis as `[id ||| ]text ||| name= v ... ||| total`.
#[must_use]
pub fn format_nbest(line_id: Option<usize>, entry: &NBestEntry) -> String {
    let scores = entry
        .scores
        .iter()
        .map(|(name, values)| {
            let rendered: Vec<String> = values.iter().map(|value| format!("{value:?}")).collect();
            format!("{name}= {}", rendered.join(" "))
        })
        .collect::<Vec<_>>()
        .join(" ");
    let mut parts = Vec::with_capacity(4);
    if let Some(id) = line_id {
        parts.push(id.to_string());
    }
    parts.push(entry.translation.clone());
    parts.push(scores);
    parts.push(format!("{:?}", entry.total_score));
    parts.join(" ||| ")
}

/// Translates each line as soon as it is read.
///
/// Connection and HTTP failures are reported inline so the user can keep
/// typing; other failures end the run.
pub struct InteractiveExecutor<'a> {
    session: TranslationSession<'a>,
}

impl<'a> InteractiveExecutor<'a> {
    /// Creates an executor over `session`.
    #[must_use]
    pub const fn new(session: TranslationSession<'a>) -> Self {
        Self { session }
    }

    /// Translates one line and writes the outcome.
    pub fn execute(&self, line: &str, output: &mut ExecutorOutput<'_>) -> Result<(), TranslateError> {
        match self.session.translate(line) {
            Ok(translation) => {
                for entry in &translation.nbest {
                    output.nbest_line(&format_nbest(None, entry))?;
                }
                output.translation(&translation.translation)?;
            }
            Err(TranslateError::Api(error)) if error.is_connect() => {
                output.translation(CONNECTION_ERROR)?;
            }
            Err(TranslateError::Api(error @ ApiError::Status { .. })) => {
                output.translation(&format!("HTTP ERROR: {error}"))?;
            }
            Err(error) => return Err(error),
        }
        output.flush()
    }
}

/// Translates queued lines on a worker pool and writes them in input order.
pub struct BatchExecutor<'a> {
    session: TranslationSession<'a>,
    workers: usize,
    lines: Vec<String>,
}

impl<'a> BatchExecutor<'a> {
    /// Creates an executor with [`DEFAULT_BATCH_WORKERS`] workers.
    #[must_use]
    pub const fn new(session: TranslationSession<'a>) -> Self {
        Self::with_workers(session, DEFAULT_BATCH_WORKERS)
    }

    /// Creates an executor with a custom pool size.
    #[must_use]
    pub const fn with_workers(session: TranslationSession<'a>, workers: usize) -> Self {
        Self {
            session,
            workers: if workers == 0 { 1 } else { workers },
            lines: Vec::new(),
        }
    }

    /// Queues one line.
    pub fn execute(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Translates every queued line and writes the results in order.
    ///
    /// N-best hypotheses carry the zero-based line id. The first failure
    /// stops further submissions and is returned once the pool drains.
    pub fn flush(&mut self, output: &mut ExecutorOutput<'_>) -> Result<(), TranslateError> {
        let queued = std::mem::take(&mut self.lines);
        if queued.is_empty() {
            return Ok(());
        }
        // Open the session once, before workers race for it.
        self.session.id()?;

        let workers = self.workers.min(queued.len());
        debug!(target: TRANSLATE_TARGET, lines = queued.len(), workers, "translating batch");
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let session = &self.session;

        thread::scope(|scope| {
            let (sender, receiver) = mpsc::channel::<(usize, Result<Translation, TranslateError>)>();
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                let worker_sender = sender.clone();
                let (cursor, halted, lines) = (&next, &stop, &queued);
                handles.push(scope.spawn(move || {
                    while !halted.load(Ordering::Relaxed) {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(line) = lines.get(index) else {
                            break;
                        };
                        if worker_sender.send((index, session.translate(line))).is_err() {
                            break;
                        }
                    }
                }));
            }
            drop(sender);

            let outcome = write_in_order(receiver, output, &stop);
            stop.store(true, Ordering::Relaxed);
            let panicked = handles
                .into_iter()
                .map(thread::ScopedJoinHandle::join)
                .filter(Result::is_err)
                .count();
            if panicked > 0 {
                warn!(target: TRANSLATE_TARGET, panicked, "translation workers panicked");
                outcome.and(Err(TranslateError::WorkerPanicked))
            } else {
                outcome
            }
        })
    }
}

fn write_in_order(
    receiver: mpsc::Receiver<(usize, Result<Translation, TranslateError>)>,
    output: &mut ExecutorOutput<'_>,
    stop: &AtomicBool,
) -> Result<(), TranslateError> {
    let mut pending = BTreeMap::new();
    let mut next_line = 0usize;
    for (index, result) in receiver {
        let translation = match result {
            Ok(translation) => translation,
            Err(error) => {
                stop.store(true, Ordering::Relaxed);
                return Err(error);
            }
        };
        pending.insert(index, translation);
        while let Some(translation) = pending.remove(&next_line) {
            output.translation(&translation.translation)?;
            for entry in &translation.nbest {
                output.nbest_line(&format_nbest(Some(next_line), entry))?;
            }
            next_line += 1;
        }
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use camino::Utf8Path;
    use rstest::rstest;

    use super::*;
    use crate::api::{ContextScore, FeatureWeights, Session, TranslationApi, TranslationOptions};
    use crate::translate::ContextSource;

    /// Echoes input upper-cased; lines starting with `slow` sleep first.
    #[derive(Default)]
    struct EchoApi {
        sessions: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl EchoApi {
        fn calls(&self) -> Vec<String> {
            self.sessions.lock().expect("lock calls").clone()
        }
    }

    impl TranslationApi for EchoApi {
        fn context_from_text(
            &self,
            _text: &str,
            _limit: Option<u32>,
        ) -> Result<Vec<ContextScore>, ApiError> {
            Ok(vec![ContextScore {
                domain: 1,
                score: 1.0,
            }])
        }

        fn context_from_file(
            &self,
            _path: &Utf8Path,
            _limit: Option<u32>,
        ) -> Result<Vec<ContextScore>, ApiError> {
            Ok(Vec::new())
        }

        fn create_session(&self, _context: &[ContextScore]) -> Result<Session, ApiError> {
            self.sessions.lock().expect("lock calls").push("create".into());
            Ok(Session { id: 9 })
        }

        fn close_session(&self, session: u64) -> Result<(), ApiError> {
            self.sessions
                .lock()
                .expect("lock calls")
                .push(format!("close {session}"));
            Err(ApiError::Status {
                status: 404,
                url: "http://localhost:8045/sessions/9".into(),
            })
        }

        fn translate(
            &self,
            source: &str,
            options: &TranslationOptions,
        ) -> Result<Translation, ApiError> {
            if self.fail_on == Some(source) {
                return Err(ApiError::Status {
                    status: 500,
                    url: "http://localhost:8045/translate".into(),
                });
            }
            if source.starts_with("slow") {
                thread::sleep(Duration::from_millis(50));
            }
            let nbest = options
                .nbest
                .map(|_| {
                    vec![NBestEntry {
                        translation: source.to_uppercase(),
                        scores: FeatureWeights::from([("LM0".to_owned(), vec![-1.5, 0.0])]),
                        total_score: -2.25,
                    }]
                })
                .unwrap_or_default();
            Ok(Translation {
                translation: source.to_uppercase(),
                nbest,
            })
        }
    }

    fn render(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).expect("utf-8 output")
    }

    #[rstest]
    fn nbest_lines_carry_optional_ids() {
        let entry = NBestEntry {
            translation: "ciao".into(),
            scores: FeatureWeights::from([
                ("DM0".to_owned(), vec![1.0, 0.5]),
                ("LM0".to_owned(), vec![-3.0]),
            ]),
            total_score: -1.25,
        };

        assert_eq!(
            format_nbest(Some(4), &entry),
            "4 ||| ciao ||| DM0= 1.0 0.5 LM0= -3.0 ||| -1.25"
        );
        assert_eq!(
            format_nbest(None, &entry),
            "ciao ||| DM0= 1.0 0.5 LM0= -3.0 ||| -1.25"
        );
    }

    #[rstest]
    fn batch_output_follows_submission_order() {
        let api = EchoApi::default();
        let mut executor = BatchExecutor::with_workers(TranslationSession::new(&api, None, None), 4);
        for line in ["slow one", "two", "slow three", "four", "five"] {
            executor.execute(line);
        }
        let mut buffer = Vec::new();

        executor
            .flush(&mut ExecutorOutput::new(&mut buffer))
            .expect("batch succeeds");

        assert_eq!(render(buffer), "SLOW ONE\nTWO\nSLOW THREE\nFOUR\nFIVE\n");
    }

    #[rstest]
    fn batch_nbest_goes_to_its_own_writer_with_line_ids() {
        let api = EchoApi::default();
        let mut executor =
            BatchExecutor::with_workers(TranslationSession::new(&api, None, Some(1)), 2);
        executor.execute("a");
        executor.execute("b");
        let mut translations = Vec::new();
        let mut nbest = Vec::new();

        executor
            .flush(&mut ExecutorOutput::new(&mut translations).with_nbest(&mut nbest))
            .expect("batch succeeds");

        assert_eq!(render(translations), "A\nB\n");
        assert_eq!(
            render(nbest),
            "0 ||| A ||| LM0= -1.5 0.0 ||| -2.25\n1 ||| B ||| LM0= -1.5 0.0 ||| -2.25\n"
        );
    }

    #[rstest]
    fn batch_failure_is_returned() {
        let api = EchoApi {
            fail_on: Some("bad"),
            ..EchoApi::default()
        };
        let mut executor = BatchExecutor::with_workers(TranslationSession::new(&api, None, None), 3);
        for line in ["good", "bad", "good again"] {
            executor.execute(line);
        }
        let mut buffer = Vec::new();

        let error = executor
            .flush(&mut ExecutorOutput::new(&mut buffer))
            .expect_err("batch fails");

        assert!(matches!(error, TranslateError::Api(ApiError::Status { status: 500, .. })));
    }

    #[rstest]
    fn interactive_http_errors_are_reported_inline() {
        let api = EchoApi {
            fail_on: Some("bad"),
            ..EchoApi::default()
        };
        let executor = InteractiveExecutor::new(TranslationSession::new(&api, None, None));
        let mut buffer = Vec::new();
        let mut output = ExecutorOutput::new(&mut buffer);

        executor.execute("bad", &mut output).expect("reported inline");
        executor.execute("fine", &mut output).expect("translated");
        drop(output);

        assert_eq!(
            render(buffer),
            "HTTP ERROR: HTTP request failed with code 500: http://localhost:8045/translate\nFINE\n"
        );
    }

    #[rstest]
    fn session_opens_once_and_closes_on_drop_ignoring_failures() {
        let api = EchoApi::default();
        {
            let session = TranslationSession::new(
                &api,
                Some(ContextSource::Text("computer".into())),
                None,
            );
            let executor = InteractiveExecutor::new(session);
            let mut buffer = Vec::new();
            let mut output = ExecutorOutput::new(&mut buffer);
            executor.execute("one", &mut output).expect("translated");
            executor.execute("two", &mut output).expect("translated");
        }

        assert_eq!(api.calls(), vec!["create".to_owned(), "close 9".to_owned()]);
    }

    #[rstest]
    fn no_context_means_no_session() {
        let api = EchoApi::default();
        drop(TranslationSession::new(&api, None, None));

        assert!(api.calls().is_empty());
    }
}
