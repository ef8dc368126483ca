//! `<`, `>` and `>>`: strips them from the argument vector, rebinds fd 0/1 for
//! the duration of one nested dispatch, then puts the old bindings back.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::PathBuf;

use nix::fcntl::{fcntl, FcntlArg};
use nix::unistd::{close, dup2};
use tracing::debug;

use crate::dispatch::Outcome;
use crate::error::{report, ExecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    Read,
    TruncateWrite,
    AppendWrite,
}

impl RedirectOp {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "<" => Some(RedirectOp::Read),
            ">" => Some(RedirectOp::TruncateWrite),
            ">>" => Some(RedirectOp::AppendWrite),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            RedirectOp::Read => "<",
            RedirectOp::TruncateWrite => ">",
            RedirectOp::AppendWrite => ">>",
        }
    }

    /// Standard descriptor this operator rebinds.
    pub fn target_fd(self) -> RawFd {
        match self {
            RedirectOp::Read => libc::STDIN_FILENO,
            RedirectOp::TruncateWrite | RedirectOp::AppendWrite => libc::STDOUT_FILENO,
        }
    }

    fn open_options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self {
            RedirectOp::Read => opts.read(true),
            RedirectOp::TruncateWrite => opts.write(true).create(true).truncate(true),
            RedirectOp::AppendWrite => opts.append(true).create(true),
        };
        opts.mode(0o666);
        opts
    }
}

impl fmt::Display for RedirectOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub op: RedirectOp,
    pub path: PathBuf,
}

/// The redirections found on a line and the argument vector left after
/// removing them.
#[derive(Debug, PartialEq, Eq)]
pub struct Resolved {
    pub redirects: Vec<Redirect>,
    pub argv: Vec<String>,
}

/// Single left-to-right pass. `Ok(None)` when the line has no operator.
pub fn scan(argv: &[String]) -> Result<Option<Resolved>> {
    let mut redirects = Vec::new();
    let mut rest = Vec::with_capacity(argv.len());
    let mut tokens = argv.iter();
    while let Some(token) = tokens.next() {
        match RedirectOp::parse(token) {
            Some(op) => {
                let path = tokens.next().ok_or(ExecError::MissingRedirectTarget(op))?;
                redirects.push(Redirect { op, path: PathBuf::from(path) });
            }
            None => rest.push(token.clone()),
        }
    }
    if redirects.is_empty() {
        return Ok(None);
    }
    Ok(Some(Resolved { redirects, argv: rest }))
}

/// Saved copies of a set of descriptors; dropping it rebinds each slot to
/// its saved copy and closes the copy.
#[derive(Debug)]
pub struct StreamGuard {
    saved: Vec<(RawFd, RawFd)>,
}

impl StreamGuard {
    pub fn save(slots: &[RawFd]) -> Result<Self> {
        let mut guard = StreamGuard { saved: Vec::with_capacity(slots.len()) };
        for &slot in slots {
            let copy = fcntl(slot, FcntlArg::F_DUPFD_CLOEXEC(0)).map_err(ExecError::Descriptor)?;
            guard.saved.push((slot, copy));
        }
        Ok(guard)
    }

    pub fn standard() -> Result<Self> {
        Self::save(&[libc::STDIN_FILENO, libc::STDOUT_FILENO])
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        for &(slot, copy) in self.saved.iter().rev() {
            if let Err(e) = dup2(copy, slot) {
                tracing::error!(slot, error = %e, "failed to restore descriptor");
            }
            let _ = close(copy);
        }
    }
}

/// Opens the redirect target and makes `slot` refer to it. The descriptor
/// returned by open is closed again before returning.
fn bind_onto(redirect: &Redirect, slot: RawFd) -> Result<()> {
    let file = redirect.op.open_options().open(&redirect.path).map_err(|source| ExecError::OpenTarget {
        path: redirect.path.clone(),
        source,
    })?;
    if file.as_raw_fd() == slot {
        // slot was free and open() handed it out; keep it
        let _ = file.into_raw_fd();
        return Ok(());
    }
    let _ = io::stdout().flush();
    dup2(file.as_raw_fd(), slot).map_err(ExecError::Descriptor)?;
    debug!(op = %redirect.op, path = %redirect.path.display(), slot, "rebound descriptor");
    Ok(())
}

pub fn bind(redirect: &Redirect) -> Result<()> {
    bind_onto(redirect, redirect.op.target_fd())
}

/// Applies any redirections on the line and hands the cleaned vector to
/// `dispatch`. Returns `NotApplicable` without touching descriptors when the
/// line has no redirection operator.
pub fn resolve<F>(argv: &[String], dispatch: F) -> Outcome
where
    F: FnOnce(&[String]) -> Outcome,
{
    match try_resolve(argv, dispatch) {
        Ok(outcome) => outcome,
        Err(e) => {
            report(&e);
            Outcome::Failure
        }
    }
}

fn try_resolve<F>(argv: &[String], dispatch: F) -> Result<Outcome>
where
    F: FnOnce(&[String]) -> Outcome,
{
    let Some(resolved) = scan(argv)? else {
        return Ok(Outcome::NotApplicable);
    };
    let _guard = StreamGuard::standard()?;
    for redirect in &resolved.redirects {
        bind(redirect)?;
    }
    if resolved.argv.is_empty() {
        // `> file` on its own: the file is created/truncated, nothing runs
        return Ok(Outcome::Success);
    }
    Ok(dispatch(&resolved.argv))
}
