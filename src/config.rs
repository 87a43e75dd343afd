use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::binfmt::BINFMT_MISC;
use crate::call::DEFAULT_ESCALATION;
use crate::errors::*;

#[derive(Debug)]
pub struct Environment(&'static str, Option<HashMap<&'static str, &'static str>>);

impl Environment {
    pub fn new(map: Option<HashMap<&'static str, &'static str>>) -> Self {
        Environment("ABCROSS", map)
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}_{}", self.0, name.to_ascii_uppercase().replace('-', "_"))
    }

    fn get_var(&self, name: &str) -> Option<String> {
        let name = self.var_name(name);
        self.1
            .as_ref()
            .and_then(|internal_map| internal_map.get(name.as_str()).map(|v| v.to_string()))
            .or_else(|| env::var(&name).ok())
    }

    fn escalation(&self) -> Option<String> {
        self.get_var("ESCALATION")
    }

    fn binfmt_misc(&self) -> Option<String> {
        self.get_var("BINFMT_MISC")
    }
}

pub fn bool_from_envvar(envvar: &str) -> bool {
    if let Ok(value) = bool::from_str(envvar) {
        value
    } else if let Ok(value) = i32::from_str(envvar) {
        value != 0
    } else {
        !envvar.is_empty()
    }
}

/// Settings read from `ABCROSS_*` environment variables.
#[derive(Debug)]
pub struct Config {
    env: Environment,
}

impl Config {
    pub fn new() -> Self {
        Config {
            env: Environment::new(None),
        }
    }

    pub fn new_with(env: Environment) -> Self {
        Config { env }
    }

    /// The command prefixed onto privileged calls, `sudo` unless
    /// `ABCROSS_ESCALATION` says otherwise.
    pub fn escalation(&self) -> Result<Vec<String>> {
        let value = match self.env.escalation() {
            Some(value) => value,
            None => return Ok(vec![DEFAULT_ESCALATION.to_owned()]),
        };
        let words = shell_words::split(&value)
            .wrap_err_with(|| format!("could not parse `ABCROSS_ESCALATION={value}`"))?;
        if words.is_empty() {
            eyre::bail!("`ABCROSS_ESCALATION` must name a program");
        }
        Ok(words)
    }

    /// Mount point of the kernel's binfmt_misc filesystem.
    pub fn binfmt_misc(&self) -> PathBuf {
        self.env
            .binfmt_misc()
            .filter(|s| !s.is_empty())
            .map_or_else(|| PathBuf::from(BINFMT_MISC), PathBuf::from)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
