use std::ffi::NulError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Side;
use crate::redirect::RedirectOp;

pub type Result<T> = std::result::Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{0}: too many arguments")]
    TooManyArguments(&'static str),

    #[error("cd: HOME not set")]
    HomeNotSet,

    #[error("cd: {}: {source}", .path.display())]
    ChangeDir { path: PathBuf, source: io::Error },

    #[error("no file given for redirection after '{0}'")]
    MissingRedirectTarget(RedirectOp),

    #[error("{}: {source}", .path.display())]
    OpenTarget { path: PathBuf, source: io::Error },

    #[error("malformed pipeline: empty command on the {0} side of '|'")]
    EmptyPipelineSide(Side),

    #[error("malformed pipeline: only one '|' is supported")]
    ExtraPipe,

    #[error("missing command")]
    EmptyCommand,

    #[error("argument contains a NUL byte: {0}")]
    Nul(#[from] NulError),

    #[error("fork() error: {0}")]
    Fork(nix::Error),

    #[error("pipe() error: {0}")]
    Pipe(nix::Error),

    #[error("wait() error: {0}")]
    Wait(nix::Error),

    #[error("descriptor error: {0}")]
    Descriptor(nix::Error),
}

/// Writes a failed command's diagnostic to stderr.
pub fn report(err: &ExecError) {
    tracing::warn!(error = %err, "command failed");
    eprintln!("{err}");
}
