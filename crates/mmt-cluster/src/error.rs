use strum::Display;

/// Broad failure classes shared by every error in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// An operation was attempted in the wrong lifecycle state.
    IllegalState,
    /// A caller supplied an unusable argument.
    IllegalArgument,
    /// An HTTP exchange with the node failed.
    Transport,
    /// An external program failed to start, stay alive or exit cleanly.
    Subprocess,
    /// A file or response did not have the expected shape.
    Parse,
    /// Local filesystem access failed.
    Io,
}
