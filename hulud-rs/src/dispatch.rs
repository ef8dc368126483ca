//! Entry point for one argument vector. Strategies are tried in a fixed
//! order: built-in, redirection (which re-enters here), pipeline, plain spawn.

use tracing::debug;

use crate::builtin;
use crate::config::Config;
use crate::jobs::Jobs;
use crate::pipeline;
use crate::redirect;
use crate::spawn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The strategy did not recognise the line.
    NotApplicable,
    Success,
    Failure,
}

#[derive(Debug, Default)]
pub struct Shell {
    config: Config,
    jobs: Jobs,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Shell { config, jobs: Jobs::default() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn jobs(&self) -> &Jobs {
        &self.jobs
    }

    pub fn dispatch(&mut self, argv: &[String]) -> Outcome {
        if self.config.reap_background {
            self.jobs.reap();
        }
        let Some(name) = argv.first() else {
            return Outcome::NotApplicable;
        };
        debug!(command = %name, argc = argv.len(), "dispatch");

        if let Some(builtin) = builtin::lookup(name) {
            return builtin(argv);
        }
        match redirect::resolve(argv, |cleaned| self.dispatch(cleaned)) {
            Outcome::NotApplicable => {}
            done => return done,
        }
        match pipeline::run(argv, &mut self.jobs) {
            Outcome::NotApplicable => {}
            done => return done,
        }
        spawn::run(argv, &mut self.jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_vector_is_not_applicable() {
        let mut shell = Shell::default();
        assert_eq!(shell.dispatch(&[]), Outcome::NotApplicable);
    }

    #[test]
    fn builtins_win_over_operators() {
        let mut shell = Shell::default();
        // `cd > x` is cd with two arguments, not a redirection.
        assert_eq!(shell.dispatch(&v(&["cd", ">", "x"])), Outcome::Failure);
        assert_eq!(shell.dispatch(&v(&["exit", "|", "wc"])), Outcome::Failure);
        assert!(shell.jobs().is_empty());
    }

    #[test]
    fn malformed_lines_spawn_nothing() {
        let mut shell = Shell::default();
        assert_eq!(shell.dispatch(&v(&["echo", ">"])), Outcome::Failure);
        assert_eq!(shell.dispatch(&v(&["ls", "|"])), Outcome::Failure);
        assert_eq!(shell.dispatch(&v(&["&"])), Outcome::Failure);
        assert!(shell.jobs().is_empty());
    }
}
