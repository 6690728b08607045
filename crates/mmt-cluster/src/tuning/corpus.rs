use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

/// Source and target language of an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    /// Language translated from.
    pub source: String,
    /// Language translated into.
    pub target: String,
}

impl LanguagePair {
    /// Builds a pair from two language codes.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {}", self.source, self.target)
    }
}

/// A corpus stored as one `<name>.<lang>` file per language in a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BilingualCorpus {
    name: String,
    folder: Utf8PathBuf,
    languages: BTreeSet<String>,
}

impl BilingualCorpus {
    /// Describes a corpus without touching the filesystem.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, folder: impl Into<Utf8PathBuf>, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            folder: folder.into(),
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    /// Groups the files of `folder` into corpora, sorted by name.
    ///
    /// Files without an extension and sub-directories are ignored.
    pub fn list(folder: &Utf8Path) -> io::Result<Vec<Self>> {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for listed in fs::read_dir(folder)? {
            let entry = listed?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if let Some((name, language)) = file_name.rsplit_once('.')
                && !name.is_empty()
                && !language.is_empty()
            {
                grouped
                    .entry(name.to_owned())
                    .or_default()
                    .insert(language.to_owned());
            }
        }
        Ok(grouped
            .into_iter()
            .map(|(name, languages)| Self {
                name,
                folder: folder.to_owned(),
                languages,
            })
            .collect())
    }

    /// Corpus name shared by every language file.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Folder holding the language files.
    #[must_use]
    pub fn folder(&self) -> &Utf8Path {
        &self.folder
    }

    /// Languages the corpus provides.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(String::as_str)
    }

    /// True when a file for `language` is part of the corpus.
    #[must_use]
    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains(language)
    }

    /// Path of the file holding `language`.
    #[must_use]
    pub fn file(&self, language: &str) -> Utf8PathBuf {
        self.folder.join(format!("{}.{language}", self.name))
    }

    /// The same corpus restricted to `languages`.
    #[must_use]
    pub fn with_languages<I, S>(&self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(self.name.clone(), self.folder.clone(), languages)
    }

    /// The same corpus relocated to `folder`.
    #[must_use]
    pub fn relocated(&self, folder: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: self.name.clone(),
            folder: folder.into(),
            languages: self.languages.clone(),
        }
    }
}
