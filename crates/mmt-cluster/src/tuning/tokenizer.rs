use std::fs::{self, File};
use std::process::{Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use super::TUNING_TARGET;
use super::command::{open_log, run_to_completion};
use super::corpus::BilingualCorpus;
use super::errors::TuningError;

/// Tokenizes corpora into a destination folder.
pub trait Tokenizer {
    /// Writes a tokenized copy of every language file of every corpus into
    /// `output` and returns the relocated corpora.
    fn process_corpora(
        &self,
        corpora: &[BilingualCorpus],
        output: &Utf8Path,
    ) -> Result<Vec<BilingualCorpus>, TuningError>;
}

/// Tokenizer backed by an external filter program.
///
/// The program receives its leading arguments followed by the language code,
/// reads the corpus on stdin and writes tokens to stdout.
#[derive(Debug, Clone)]
pub struct CommandTokenizer {
    program: String,
    arguments: Vec<String>,
    log_path: Utf8PathBuf,
}

impl CommandTokenizer {
    /// Creates a tokenizer logging the program's stderr to `log_path`.
    #[must_use]
    pub fn new(program: impl Into<String>, log_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
            arguments: Vec::new(),
            log_path: log_path.into(),
        }
    }

    /// Adds arguments placed before the language code.
    #[must_use]
    pub fn args<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
        self
    }

    fn tokenize(&self, input: &Utf8Path, output: &Utf8Path, language: &str) -> Result<(), TuningError> {
        let stdin = File::open(input).map_err(|source| TuningError::CorpusFile {
            path: input.to_owned(),
            source,
        })?;
        let stdout = File::create(output).map_err(|source| TuningError::CorpusFile {
            path: output.to_owned(),
            source,
        })?;
        let stderr = open_log(&self.log_path)?;
        let mut command = Command::new(&self.program);
        command
            .args(&self.arguments)
            .arg(language)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));
        run_to_completion(&mut command, &self.program, &self.log_path)
    }
}

impl Tokenizer for CommandTokenizer {
    fn process_corpora(
        &self,
        corpora: &[BilingualCorpus],
        output: &Utf8Path,
    ) -> Result<Vec<BilingualCorpus>, TuningError> {
        fs::create_dir_all(output).map_err(|source| TuningError::Workspace {
            path: output.to_owned(),
            source,
        })?;
        let mut tokenized = Vec::with_capacity(corpora.len());
        for corpus in corpora {
            let relocated = corpus.relocated(output);
            for language in corpus.languages() {
                let source = corpus.file(language);
                let destination = relocated.file(language);
                info!(
                    target: TUNING_TARGET,
                    file = %source,
                    language,
                    "tokenizing corpus file"
                );
                self.tokenize(&source, &destination, language)?;
            }
            tokenized.push(relocated);
        }
        Ok(tokenized)
    }
}
