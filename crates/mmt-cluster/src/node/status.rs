//! Node status levels and the status file format.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use strum::{Display, EnumIter, EnumString};

/// Lifecycle level published by the node.
///
/// Levels are ordered by [`NodeStatus::rank`]. While the process lives its
/// status never decreases. [`NodeStatus::Error`] sits outside the normal
/// progression and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    /// Nothing has been published.
    None,
    /// Node object created.
    Created,
    /// Joining the cluster.
    Joining,
    /// Cluster joined.
    Joined,
    /// Catching up on the data stream.
    Synchronizing,
    /// Data stream caught up.
    Synchronized,
    /// Loading models.
    Loading,
    /// Models loaded.
    Loaded,
    /// Applying updates.
    Updating,
    /// Updates applied.
    Updated,
    /// Serving requests.
    Ready,
    /// Shutting down.
    Shutdown,
    /// Stopped.
    Terminated,
    /// Failed.
    Error,
}

impl NodeStatus {
    /// Fixed numeric rank.
    #[must_use]
    pub const fn rank(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Created => 100,
            Self::Joining => 200,
            Self::Joined => 300,
            Self::Synchronizing => 400,
            Self::Synchronized => 500,
            Self::Loading => 600,
            Self::Loaded => 700,
            Self::Updating => 800,
            Self::Updated => 900,
            Self::Ready => 1000,
            Self::Shutdown => 1100,
            Self::Terminated => 1200,
            Self::Error => 9999,
        }
    }

    /// True when this status is at or beyond `target`.
    #[must_use]
    pub const fn has_reached(self, target: Self) -> bool {
        self.rank() >= target.rank()
    }
}

impl PartialOrd for NodeStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeStatus {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// A status file line that is neither blank, a comment, nor `key=value`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: expected a single key=value pair, found '{content}'")]
pub struct NodeStatusParseError {
    /// One-based line number.
    pub line: usize,
    /// Offending line.
    pub content: String,
}

/// Parsed content of the node status file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeState {
    entries: BTreeMap<String, String>,
}

impl NodeState {
    /// Parses `key=value` lines, skipping blank lines and `#` comments.
    ///
    /// Values may not contain `=`; such lines are rejected rather than
    /// guessed at.
    pub fn parse(content: &str) -> Result<Self, NodeStatusParseError> {
        let mut entries = BTreeMap::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split('=');
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(NodeStatusParseError {
                    line: index + 1,
                    content: line.to_owned(),
                });
            };
            entries.insert(key.to_owned(), value.to_owned());
        }
        Ok(Self { entries })
    }

    /// Status named by the `status` key; unknown or missing means
    /// [`NodeStatus::None`].
    #[must_use]
    pub fn status(&self) -> NodeStatus {
        self.get("status")
            .and_then(|value| value.parse().ok())
            .unwrap_or(NodeStatus::None)
    }

    /// Value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// All entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    fn ranks_follow_declaration_order() {
        let ranks: Vec<u32> = NodeStatus::iter().map(NodeStatus::rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        assert_eq!(ranks, sorted);
        assert_eq!(NodeStatus::Ready.rank(), 1000);
        assert_eq!(NodeStatus::Error.rank(), 9999);
    }

    #[rstest]
    #[case(NodeStatus::Ready, NodeStatus::Ready, true)]
    #[case(NodeStatus::Updated, NodeStatus::Ready, false)]
    #[case(NodeStatus::Terminated, NodeStatus::Ready, true)]
    #[case(NodeStatus::Error, NodeStatus::Terminated, true)]
    fn reaching_targets(#[case] current: NodeStatus, #[case] target: NodeStatus, #[case] reached: bool) {
        assert_eq!(current.has_reached(target), reached);
        assert_eq!(current >= target, reached);
    }

    #[rstest]
    fn parses_status_and_extra_keys() {
        let state = NodeState::parse("# written by node\nstatus=READY\n\nuuid=abc\n")
            .expect("state should parse");
        assert_eq!(state.status(), NodeStatus::Ready);
        assert_eq!(state.get("uuid"), Some("abc"));
        assert_eq!(state.entries().count(), 2);
    }

    #[rstest]
    #[case("uuid=abc\n")]
    #[case("status=WARMING\n")]
    #[case("")]
    fn unknown_or_missing_status_is_none(#[case] content: &str) {
        let state = NodeState::parse(content).expect("state should parse");
        assert_eq!(state.status(), NodeStatus::None);
    }

    #[rstest]
    #[case("status=READY\nurl=http://host/?a=b\n", 2)]
    #[case("status\n", 1)]
    fn rejects_ambiguous_lines(#[case] content: &str, #[case] line: usize) {
        let error = NodeState::parse(content).expect_err("line should be rejected");
        assert_eq!(error.line, line);
    }
}
