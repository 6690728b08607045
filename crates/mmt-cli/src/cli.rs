//! Command-line interface definition for the `mmt` command.

use camino::Utf8PathBuf;
use clap::{ArgGroup, Args, Parser, Subcommand};

/// Command-line interface of a ModernMT cluster node.
#[derive(Parser, Debug)]
#[command(name = "mmt", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Starts the engine node, and its embedded broker unless joining a
    /// cluster, then waits until it is ready.
    Start(StartArgs),
    /// Stops the engine node and the broker it owns.
    Stop,
    /// Prints the node's running state and published status.
    Status,
    /// Tunes the decoder weights of a running node.
    Tune(TuneArgs),
    /// Translates text through a running node.
    Translate(TranslateArgs),
    /// Manages the domains of a running node.
    Domain {
        /// Domain operation.
        #[command(subcommand)]
        action: DomainAction,
    },
}

/// Options of `mmt start`.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct StartArgs {
    /// Address of an existing cluster member to join.
    #[arg(long, value_name = "HOST")]
    pub(crate) member: Option<String>,
    /// Starts the node without its REST API.
    #[arg(long)]
    pub(crate) no_api: bool,
    /// Node log verbosity.
    #[arg(short, long, value_name = "LEVEL")]
    pub(crate) verbosity: Option<u8>,
}

/// Options of `mmt tune`.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct TuneArgs {
    /// Folder of development corpora; defaults to the engine's dev folder.
    #[arg(value_name = "CORPORA")]
    pub(crate) corpora: Option<Utf8PathBuf>,
    /// Keeps the working directory after the run.
    #[arg(long)]
    pub(crate) debug: bool,
    /// Disables context analysis while the optimizer translates.
    #[arg(long)]
    pub(crate) no_context: bool,
    /// Lets the optimizer pick non-deterministic seeds.
    #[arg(long)]
    pub(crate) random_seeds: bool,
    /// Optimizer iteration bound; zero removes it.
    #[arg(long, value_name = "N")]
    pub(crate) max_iterations: Option<u32>,
}

/// Options of `mmt translate`.
#[derive(Args, Debug, Clone, Default)]
#[command(group(ArgGroup::new("context_source").args(["context", "context_file", "context_weights"])))]
pub(crate) struct TranslateArgs {
    /// Text whose context guides the translation.
    #[arg(long, value_name = "TEXT")]
    pub(crate) context: Option<String>,
    /// File, readable by the node, whose context guides the translation.
    #[arg(long, value_name = "FILE")]
    pub(crate) context_file: Option<Utf8PathBuf>,
    /// Explicit context as comma-separated `id:score` pairs.
    #[arg(long, value_name = "WEIGHTS")]
    pub(crate) context_weights: Option<String>,
    /// Number of alternative hypotheses per line.
    #[arg(long, value_name = "N")]
    pub(crate) nbest: Option<u32>,
    /// Writes n-best lists to this file instead of standard output.
    #[arg(long, value_name = "FILE", requires = "nbest")]
    pub(crate) nbest_file: Option<Utf8PathBuf>,
    /// Reads every line first and translates them in parallel.
    #[arg(long)]
    pub(crate) batch: bool,
    /// Text to translate; standard input is read line by line otherwise.
    #[arg(value_name = "TEXT")]
    pub(crate) text: Option<String>,
}

/// Domain operations.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum DomainAction {
    /// Creates a domain from a TMX file.
    Create {
        /// TMX file readable by the node.
        tmx: Utf8PathBuf,
        /// Domain name; defaults to the file name without extension.
        #[arg(long)]
        name: Option<String>,
    },
    /// Imports a TMX file into an existing domain.
    Import {
        /// Domain id or unique name.
        domain: String,
        /// TMX file readable by the node.
        tmx: Utf8PathBuf,
    },
    /// Appends one sentence pair to an existing domain.
    Append {
        /// Domain id or unique name.
        domain: String,
        /// Source sentence.
        source: String,
        /// Target sentence.
        target: String,
    },
}
