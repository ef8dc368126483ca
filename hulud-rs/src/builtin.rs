use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::dispatch::Outcome;
use crate::error::{report, ExecError, Result};

pub type Builtin = fn(&[String]) -> Outcome;

pub fn lookup(name: &str) -> Option<Builtin> {
    match name {
        "exit" => Some(builtin_exit),
        "cd" => Some(builtin_cd),
        _ => None,
    }
}

pub fn builtin_exit(argv: &[String]) -> Outcome {
    if argv.len() > 1 {
        report(&ExecError::TooManyArguments("exit"));
        return Outcome::Failure;
    }
    let _ = io::stdout().flush();
    std::process::exit(0)
}

pub fn builtin_cd(argv: &[String]) -> Outcome {
    match change_dir(&argv[1..]) {
        Ok(dir) => {
            debug!(dir = %dir.display(), "changed directory");
            Outcome::Success
        }
        Err(e) => {
            report(&e);
            Outcome::Failure
        }
    }
}

/// Where `cd args` goes: `HOME` for no argument or `~`, else the argument.
fn cd_target(args: &[String], home: Option<OsString>) -> Result<PathBuf> {
    match args {
        [] => home.map(PathBuf::from).ok_or(ExecError::HomeNotSet),
        [dir] if dir == "~" => home.map(PathBuf::from).ok_or(ExecError::HomeNotSet),
        [dir] => Ok(PathBuf::from(dir)),
        _ => Err(ExecError::TooManyArguments("cd")),
    }
}

pub fn change_dir(args: &[String]) -> Result<PathBuf> {
    let dir = cd_target(args, env::var_os("HOME"))?;
    env::set_current_dir(&dir).map_err(|source| ExecError::ChangeDir { path: dir.clone(), source })?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn lookup_knows_only_exit_and_cd() {
        assert!(lookup("exit").is_some());
        assert!(lookup("cd").is_some());
        assert!(lookup("ls").is_none());
        assert!(lookup("history").is_none());
    }

    #[test]
    fn home_for_bare_cd_and_tilde() {
        let home = Some(OsString::from("/tmp"));
        assert_eq!(cd_target(&[], home.clone()).unwrap(), PathBuf::from("/tmp"));
        assert_eq!(cd_target(&v(&["~"]), home.clone()).unwrap(), PathBuf::from("/tmp"));
        assert_eq!(cd_target(&v(&["/var"]), home).unwrap(), PathBuf::from("/var"));
    }

    #[test]
    fn unset_home_is_an_error() {
        assert!(matches!(cd_target(&[], None), Err(ExecError::HomeNotSet)));
        assert_eq!(cd_target(&v(&["src"]), None).unwrap(), PathBuf::from("src"));
    }

    #[test]
    fn cd_rejects_two_paths_without_moving() {
        let before = env::current_dir().unwrap();
        assert!(matches!(
            cd_target(&v(&["a", "b"]), Some(OsString::from("/tmp"))),
            Err(ExecError::TooManyArguments("cd"))
        ));
        assert_eq!(builtin_cd(&v(&["cd", "a", "b"])), Outcome::Failure);
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn cd_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        match change_dir(&v(&[missing.to_str().unwrap()])) {
            Err(ExecError::ChangeDir { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exit_with_arguments_does_not_terminate() {
        assert_eq!(builtin_exit(&v(&["exit", "now"])), Outcome::Failure);
        assert_eq!(builtin_exit(&v(&["exit", "1", "2"])), Outcome::Failure);
    }
}
