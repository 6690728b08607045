//! Cross-module suites for the cluster supervisor.

mod support;
