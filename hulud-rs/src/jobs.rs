use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::debug;

/// Background children that have not been reaped yet.
#[derive(Debug, Default)]
pub struct Jobs {
    pids: Vec<Pid>,
}

impl Jobs {
    pub fn track(&mut self, pid: Pid) {
        self.pids.push(pid);
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Collects every tracked child that has finished, without blocking.
    pub fn reap(&mut self) -> Vec<(Pid, WaitStatus)> {
        let mut done = Vec::new();
        self.pids.retain(|&pid| match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => true,
            Ok(status) => {
                debug!(%pid, ?status, "reaped background child");
                done.push((pid, status));
                false
            }
            // ECHILD: someone else already collected it
            Err(_) => false,
        });
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{fork, ForkResult};
    use std::time::{Duration, Instant};

    fn fork_exiting(code: i32) -> Pid {
        match unsafe { fork() }.expect("fork") {
            ForkResult::Parent { child } => child,
            ForkResult::Child => unsafe { libc::_exit(code) },
        }
    }

    #[test]
    fn reap_collects_finished_children() {
        let mut jobs = Jobs::default();
        let pid = fork_exiting(3);
        jobs.track(pid);
        assert_eq!(jobs.len(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut reaped = Vec::new();
        while reaped.is_empty() && Instant::now() < deadline {
            reaped = jobs.reap();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(reaped, vec![(pid, WaitStatus::Exited(pid, 3))]);
        assert!(jobs.is_empty());
    }

    #[test]
    fn unknown_pid_is_dropped() {
        let mut jobs = Jobs::default();
        // Not our child: waitpid fails with ECHILD.
        jobs.track(Pid::from_raw(1));
        assert!(jobs.reap().is_empty());
        assert!(jobs.is_empty());
    }
}
