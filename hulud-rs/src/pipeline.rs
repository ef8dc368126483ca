//! `left | right`: one pipe, two children forked from the shell.

use std::fmt;
use std::os::unix::io::{AsRawFd, RawFd};

use nix::unistd::{close, dup2, pipe};
use tracing::debug;

use crate::argv::{strip_background, PIPE};
use crate::dispatch::Outcome;
use crate::error::{report, ExecError, Result};
use crate::jobs::Jobs;
use crate::spawn::{self, Prepared};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

/// One side of the pipe, with its own `&` already removed.
#[derive(Debug, PartialEq, Eq)]
pub struct Stage<'a> {
    pub argv: &'a [String],
    pub background: bool,
}

impl<'a> Stage<'a> {
    fn new(tokens: &'a [String], side: Side) -> Result<Self> {
        let (argv, background) = strip_background(tokens);
        if argv.is_empty() {
            return Err(ExecError::EmptyPipelineSide(side));
        }
        Ok(Stage { argv, background })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Pipeline<'a> {
    pub left: Stage<'a>,
    pub right: Stage<'a>,
}

/// Splits at the first `|`. `Ok(None)` when there is none.
pub fn split(argv: &[String]) -> Result<Option<Pipeline<'_>>> {
    let Some(at) = argv.iter().position(|t| t == PIPE) else {
        return Ok(None);
    };
    let (left, right) = (&argv[..at], &argv[at + 1..]);
    if right.iter().any(|t| t == PIPE) {
        return Err(ExecError::ExtraPipe);
    }
    Ok(Some(Pipeline {
        left: Stage::new(left, Side::Left)?,
        right: Stage::new(right, Side::Right)?,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Writes into the pipe (left side).
    Producer,
    /// Reads from the pipe (right side).
    Consumer,
}

/// What a pipeline child does to its descriptors before exec: close the end
/// it does not use, move the other end onto a standard slot, close the
/// original of that end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdioWiring {
    pub unused: RawFd,
    pub source: RawFd,
    pub target: RawFd,
}

impl StdioWiring {
    pub fn for_role(role: Role, read_end: RawFd, write_end: RawFd) -> Self {
        match role {
            Role::Producer => StdioWiring { unused: read_end, source: write_end, target: libc::STDOUT_FILENO },
            Role::Consumer => StdioWiring { unused: write_end, source: read_end, target: libc::STDIN_FILENO },
        }
    }

    pub fn install(&self) -> nix::Result<()> {
        close(self.unused)?;
        if self.source != self.target {
            dup2(self.source, self.target)?;
            close(self.source)?;
        }
        Ok(())
    }
}

pub fn run(argv: &[String], jobs: &mut Jobs) -> Outcome {
    match try_run(argv, jobs) {
        Ok(outcome) => outcome,
        Err(e) => {
            report(&e);
            Outcome::Failure
        }
    }
}

fn try_run(argv: &[String], jobs: &mut Jobs) -> Result<Outcome> {
    let Some(pipeline) = split(argv)? else {
        return Ok(Outcome::NotApplicable);
    };
    let producer = Prepared::new(pipeline.left.argv)?;
    let consumer = Prepared::new(pipeline.right.argv)?;

    let (read_end, write_end) = pipe().map_err(ExecError::Pipe)?;
    let (r, w) = (read_end.as_raw_fd(), write_end.as_raw_fd());
    debug!(read = r, write = w, "pipe created");

    let left = spawn::fork_exec(&producer, Some(StdioWiring::for_role(Role::Producer, r, w)))?;
    let right = spawn::fork_exec(&consumer, Some(StdioWiring::for_role(Role::Consumer, r, w)));
    // Only the children need the pipe.
    drop(read_end);
    drop(write_end);

    let right = match right {
        Ok(pid) => pid,
        Err(e) => {
            let _ = spawn::settle(left, pipeline.left.background, jobs);
            return Err(e);
        }
    };
    spawn::settle(left, pipeline.left.background, jobs)?;
    spawn::settle(right, pipeline.right.background, jobs)
}
