//! Execution-context detection and event formatting.
//!
//! Three execution contexts are distinguished by environment markers. The
//! detected context selects only how pipeline events are rendered (GitHub
//! workflow commands, Azure Pipelines logging commands, or plain text); it
//! has no effect on pipeline logic or data.

use clap::ValueEnum;

/// Execution context the pipeline is running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CiMode {
    /// Detect from environment markers.
    Auto,
    /// GitHub Actions formatting (`::warning::`, `::error::`).
    Github,
    /// Azure Pipelines formatting (`##vso[task.logissue ...]`).
    Azure,
    /// Plain local output.
    Local,
}

/// Resolved context after `Auto` detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiContext {
    /// GitHub Actions.
    Github,
    /// Azure Pipelines.
    Azure,
    /// No CI markers present.
    Local,
}

impl CiContext {
    /// Resolves the requested mode, consulting environment markers for `Auto`.
    pub fn detect(mode: CiMode) -> Self {
        match mode {
            CiMode::Github => Self::Github,
            CiMode::Azure => Self::Azure,
            CiMode::Local => Self::Local,
            CiMode::Auto => {
                if std::env::var_os("GITHUB_ACTIONS").is_some() {
                    Self::Github
                } else if std::env::var_os("TF_BUILD").is_some() {
                    Self::Azure
                } else {
                    Self::Local
                }
            }
        }
    }

    /// Formats a warning event for this context.
    pub fn format_warning(&self, message: &str) -> String {
        match self {
            Self::Github => format!("::warning::{message}"),
            Self::Azure => format!("##vso[task.logissue type=warning]{message}"),
            Self::Local => format!("warning: {message}"),
        }
    }

    /// Formats an error event for this context.
    pub fn format_error(&self, message: &str) -> String {
        match self {
            Self::Github => format!("::error::{message}"),
            Self::Azure => format!("##vso[task.logissue type=error]{message}"),
            Self::Local => format!("error: {message}"),
        }
    }

    /// Formats a section/group header for this context.
    pub fn format_section(&self, title: &str) -> String {
        match self {
            Self::Github => format!("::group::{title}"),
            Self::Azure => format!("##[section]{title}"),
            Self::Local => format!("==> {title}"),
        }
    }
}
