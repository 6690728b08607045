//! `mmt tune`.

use std::io::Write;
use std::sync::Arc;

use mmt_cluster::node::NodeSettings;
use mmt_cluster::tuning::{
    BilingualCorpus, CommandTokenizer, LanguagePair, MertOptimizer, TuningCollaborators,
    TuningOptions, TuningPipeline, TuningSettings,
};
use mmt_cluster::{NodeSupervisor, SystemProcessControl};
use mmt_config::{Config, EnginePaths};

use crate::AppError;
use crate::cli::TuneArgs;
use crate::output::{CommandOutput, ConsoleTuningReporter};

const TOKENIZER_LOG: &str = "tokenizer.log";

fn options(args: &TuneArgs) -> TuningOptions {
    let defaults = TuningOptions::default();
    TuningOptions {
        context_analysis: !args.no_context,
        random_seeds: args.random_seeds,
        max_iterations: args.max_iterations.unwrap_or(defaults.max_iterations),
        debug: args.debug,
    }
}

pub(super) fn tune<W: Write, E: Write>(
    config: &Config,
    args: &TuneArgs,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let (source, target) = config.language_pair().ok_or(AppError::MissingLanguagePair)?;
    let paths = EnginePaths::prepare(config)?;
    let corpora_dir = args
        .corpora
        .clone()
        .unwrap_or_else(|| paths.dev_corpora_dir());
    let corpora =
        BilingualCorpus::list(&corpora_dir).map_err(|source_error| AppError::ListCorpora {
            path: corpora_dir.clone(),
            source: source_error,
        })?;

    let node = NodeSupervisor::new(
        Arc::new(SystemProcessControl::new()),
        NodeSettings::from_config(config, &paths),
        None,
    );
    let client = node.rest_client()?;
    let tokenizer = CommandTokenizer::new(
        config.tokenizer_program(),
        paths.logs_dir().join(TOKENIZER_LOG),
    );
    let optimizer = MertOptimizer::from_config(config);
    let reporter = ConsoleTuningReporter::new(&mut output.stdout);
    let settings = TuningSettings {
        engine: paths.engine().to_owned(),
        languages: LanguagePair::new(source, target),
        temp_dir: paths.temp_dir().to_path_buf(),
        logs_dir: paths.logs_dir().to_path_buf(),
    };
    let pipeline = TuningPipeline::new(
        settings,
        TuningCollaborators {
            node: &node,
            features: &client,
            tokenizer: &tokenizer,
            optimizer: &optimizer,
            reporter: &reporter,
        },
    );
    pipeline.run(&corpora, Some(&corpora_dir), options(args))?;
    Ok(())
}
