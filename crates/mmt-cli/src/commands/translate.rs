//! `mmt translate`.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};

use mmt_cluster::RestClient;
use mmt_cluster::translate::{
    BatchExecutor, ContextSource, ExecutorOutput, InteractiveExecutor, TranslateError,
    TranslationSession, parse_context_weights,
};
use mmt_config::Config;

use crate::AppError;
use crate::cli::TranslateArgs;
use crate::output::CommandOutput;

fn context_source(args: &TranslateArgs) -> Result<Option<ContextSource>, TranslateError> {
    if let Some(text) = &args.context {
        return Ok(Some(ContextSource::Text(text.clone())));
    }
    if let Some(path) = &args.context_file {
        return Ok(Some(ContextSource::File(path.clone())));
    }
    args.context_weights
        .as_deref()
        .map(|weights| parse_context_weights(weights).map(ContextSource::Weights))
        .transpose()
}

/// Translates the text argument, or every line of `input` when none is
/// given.
pub(crate) fn translate<R: BufRead, W: Write, E: Write>(
    config: &Config,
    args: &TranslateArgs,
    input: R,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let context = context_source(args)?;
    let client = RestClient::local(config.api_port())?;
    let session = TranslationSession::new(&client, context, args.nbest);

    let mut nbest_file = args
        .nbest_file
        .as_ref()
        .map(|path| {
            File::create(path)
                .map(BufWriter::new)
                .map_err(|source| AppError::NbestFile {
                    path: path.clone(),
                    source,
                })
        })
        .transpose()?;
    let mut sink = ExecutorOutput::new(&mut output.stdout);
    if let Some(file) = nbest_file.as_mut() {
        sink = sink.with_nbest(file);
    }

    let lines: Box<dyn Iterator<Item = Result<String, AppError>> + '_> = match &args.text {
        Some(text) => Box::new(std::iter::once(Ok(text.clone()))),
        None => Box::new(input.lines().map(|line| line.map_err(AppError::ReadInput))),
    };

    if args.batch {
        let mut executor = BatchExecutor::new(session);
        for line in lines {
            executor.execute(line?);
        }
        executor.flush(&mut sink)?;
    } else {
        let executor = InteractiveExecutor::new(session);
        for line in lines {
            executor.execute(&line?, &mut sink)?;
        }
    }
    Ok(())
}
