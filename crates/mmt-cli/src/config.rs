//! Configuration loading helpers for the `mmt` command.
//!
//! Recognised configuration flags are peeled off the front of the argument
//! list and handed to `ortho_config`; everything from the first other token
//! onwards belongs to the command parser.

use std::ffi::{OsStr, OsString};

use mmt_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    ///
    /// Configuration flags must precede the command. Flags after it are
    /// parsed as command arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = text
        .split_once('=')
        .map_or((&*text, false), |(flag, _)| (flag, true));
    if super::CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments destined for the loader and the index where the command begins.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut iter = args.iter();
    let Some(program) = iter.next() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut command_start = 1usize;
    let mut pending_value = false;
    for argument in iter {
        if pending_value {
            pending_value = false;
        } else {
            match classify(argument) {
                FlagAction::Include { needs_value } => pending_value = needs_value,
                FlagAction::Stop => break,
            }
        }
        config_arguments.push(argument.clone());
        command_start += 1;
    }

    ConfigArgumentSplit {
        config_arguments,
        command_start,
    }
}

/// Program name followed by the command tokens.
pub(crate) fn command_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    args.first()
        .into_iter()
        .chain(args.iter().skip(split.command_start))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os_args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case("--api-port", FlagAction::Include { needs_value: true })]
    #[case("--unknown", FlagAction::Stop)]
    #[case("translate", FlagAction::Stop)]
    fn flags_are_classified(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify(OsStr::new(argument)), expected);
    }

    #[rstest]
    fn leading_configuration_flags_are_split_from_the_command() {
        let args = os_args(&[
            "mmt",
            "--engine",
            "en-it",
            "--log-format=json",
            "translate",
            "--nbest",
            "3",
        ]);
        let split = split_config_arguments(&args);

        assert_eq!(
            split.config_arguments,
            os_args(&["mmt", "--engine", "en-it", "--log-format=json"])
        );
        assert_eq!(
            command_arguments(&args, &split),
            os_args(&["mmt", "translate", "--nbest", "3"])
        );
    }

    #[rstest]
    fn flags_after_the_command_stay_with_the_command() {
        let args = os_args(&["mmt", "status", "--engine", "en-it"]);
        let split = split_config_arguments(&args);

        assert_eq!(split.config_arguments, os_args(&["mmt"]));
        assert_eq!(split.command_start, 1);
    }

    #[rstest]
    fn empty_argument_lists_split_cleanly() {
        let split = split_config_arguments(&[]);
        assert!(split.config_arguments.is_empty());
        assert!(command_arguments(&[], &split).is_empty());
    }
}
