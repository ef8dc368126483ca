use std::env;

pub const PROMPT_VAR: &str = "HULUD_PROMPT";
pub const REAP_VAR: &str = "HULUD_REAP";
pub const LOG_VAR: &str = "HULUD_LOG";

const DEFAULT_PROMPT: &str = "> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Printed before each line when stdin is a terminal.
    pub prompt: String,
    /// Collect finished background children before each command.
    pub reap_background: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { prompt: DEFAULT_PROMPT.to_string(), reap_background: true }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(prompt) = lookup(PROMPT_VAR) {
            config.prompt = prompt;
        }
        if let Some(raw) = lookup(REAP_VAR) {
            match parse_flag(&raw) {
                Some(flag) => config.reap_background = flag,
                None => tracing::warn!(var = REAP_VAR, value = %raw, "not a boolean, keeping default"),
            }
        }
        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_without_env() {
        assert_eq!(from_pairs(&[]), Config::default());
        assert_eq!(Config::default().prompt, "> ");
        assert!(Config::default().reap_background);
    }

    #[test]
    fn env_overrides() {
        let config = from_pairs(&[(PROMPT_VAR, "$ "), (REAP_VAR, "off")]);
        assert_eq!(config.prompt, "$ ");
        assert!(!config.reap_background);
    }

    #[test]
    fn bad_flag_keeps_default() {
        assert!(from_pairs(&[(REAP_VAR, "maybe")]).reap_background);
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
    }
}
