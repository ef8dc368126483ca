//! Forking and exec'ing a single command, plus the foreground/background
//! bookkeeping shared with the pipeline.

use std::ffi::CString;
use std::io::{self, Write};

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};
use tracing::debug;

use crate::argv::{strip_background, to_cstrings};
use crate::dispatch::Outcome;
use crate::error::{report, ExecError, Result};
use crate::jobs::Jobs;
use crate::pipeline::StdioWiring;

const EXIT_NOT_FOUND: i32 = 127;
const EXIT_WIRING: i32 = 126;

/// A command ready to exec: C argument array and the diagnostic the child
/// prints if exec fails. Built before fork.
#[derive(Debug)]
pub struct Prepared {
    argv: Vec<CString>,
    not_found: Vec<u8>,
}

impl Prepared {
    pub fn new(argv: &[String]) -> Result<Self> {
        let name = argv.first().ok_or(ExecError::EmptyCommand)?;
        let not_found = format!("{name}: command not found\n").into_bytes();
        Ok(Prepared { argv: to_cstrings(argv)?, not_found })
    }

    pub fn name(&self) -> &str {
        self.argv[0].to_str().unwrap_or("?")
    }
}

fn exec_child(cmd: &Prepared) -> ! {
    let _ = execvp(&cmd.argv[0], &cmd.argv);
    unsafe {
        libc::write(
            libc::STDERR_FILENO,
            cmd.not_found.as_ptr() as *const libc::c_void,
            cmd.not_found.len(),
        );
        libc::_exit(EXIT_NOT_FOUND)
    }
}

/// Forks a child that installs `wiring` (if any) and execs `cmd`.
pub fn fork_exec(cmd: &Prepared, wiring: Option<StdioWiring>) -> Result<Pid> {
    // Unflushed shell output would otherwise be lost or land after the child's.
    let _ = io::stdout().flush();
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(pid = %child, command = cmd.name(), "forked");
            Ok(child)
        }
        Ok(ForkResult::Child) => {
            if let Some(wiring) = wiring {
                if wiring.install().is_err() {
                    unsafe { libc::_exit(EXIT_WIRING) }
                }
            }
            exec_child(cmd)
        }
        Err(e) => Err(ExecError::Fork(e)),
    }
}

pub fn wait_foreground(pid: Pid) -> Result<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::Wait(e)),
            Ok(status) => {
                debug!(%pid, ?status, "reaped foreground child");
                return Ok(status);
            }
        }
    }
}

pub fn outcome_of(status: WaitStatus) -> Outcome {
    match status {
        WaitStatus::Exited(_, 0) => Outcome::Success,
        _ => Outcome::Failure,
    }
}

/// Waits for a foreground child, or reports and tracks a background one.
pub fn settle(pid: Pid, background: bool, jobs: &mut Jobs) -> Result<Outcome> {
    if background {
        eprintln!("Background Process: {pid}");
        jobs.track(pid);
        return Ok(Outcome::Success);
    }
    Ok(outcome_of(wait_foreground(pid)?))
}

/// Runs a plain command, honoring a trailing `&`.
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
    let (argv, background) = strip_background(argv);
    let cmd = Prepared::new(argv)?;
    let pid = fork_exec(&cmd, None)?;
    settle(pid, background, jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    fn v(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn prepared_carries_not_found_message() {
        let cmd = Prepared::new(&v(&["no-such-tool", "-x"])).unwrap();
        assert_eq!(cmd.name(), "no-such-tool");
        assert_eq!(cmd.not_found, b"no-such-tool: command not found\n");
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(Prepared::new(&[]), Err(ExecError::EmptyCommand)));
        let mut jobs = Jobs::default();
        assert_eq!(run(&v(&["&"]), &mut jobs), Outcome::Failure);
        assert!(jobs.is_empty());
    }

    #[test]
    fn exit_status_maps_to_outcome() {
        let pid = Pid::from_raw(1);
        assert_eq!(outcome_of(WaitStatus::Exited(pid, 0)), Outcome::Success);
        assert_eq!(outcome_of(WaitStatus::Exited(pid, 127)), Outcome::Failure);
        assert_eq!(outcome_of(WaitStatus::Signaled(pid, Signal::SIGPIPE, false)), Outcome::Failure);
    }
}
