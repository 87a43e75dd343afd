use std::fmt;
use std::process::{Command, ExitStatus, Output};

use crate::errors::*;
use crate::shell::MessageInfo;

pub trait CommandExt {
    fn fmt_message(&self) -> String;

    fn print_verbose(&self, msg_info: &mut MessageInfo) -> Result<()> {
        if msg_info.is_verbose() {
            msg_info.debug(format_args!("+ {}", self.fmt_message()))?;
        }
        Ok(())
    }

    /// Runs the command to completion with inherited stdio.
    ///
    /// The exit status is returned as is, a failing child is not an error.
    fn run_and_get_status(&mut self, msg_info: &mut MessageInfo) -> Result<ExitStatus>;

    /// Runs the command to completion, capturing stdout and stderr.
    ///
    /// The exit status is not checked.
    fn run_and_get_output(&mut self, msg_info: &mut MessageInfo) -> Result<Output>;
}

impl CommandExt for Command {
    fn fmt_message(&self) -> String {
        let program = self.get_program().to_string_lossy();
        let args = self.get_args().map(|arg| arg.to_string_lossy());
        shell_words::join(std::iter::once(program).chain(args))
    }

    fn run_and_get_status(&mut self, msg_info: &mut MessageInfo) -> Result<ExitStatus> {
        self.print_verbose(msg_info)?;
        self.status()
            .map_err(|e| CommandError::CouldNotExecute {
                source: Box::new(e),
                command: self.fmt_message(),
            })
            .map_err(Into::into)
    }

    fn run_and_get_output(&mut self, msg_info: &mut MessageInfo) -> Result<Output> {
        self.print_verbose(msg_info)?;
        self.output()
            .map_err(|e| CommandError::CouldNotExecute {
                source: Box::new(e),
                command: self.fmt_message(),
            })
            .map_err(Into::into)
    }
}

pub trait OutputExt {
    fn stdout_lossy(&self) -> String;
    fn stderr_lossy(&self) -> String;
}

impl OutputExt for Output {
    fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Formats an argument vector the way a shell would read it back.
#[derive(Debug, Clone, Copy)]
pub struct Argv<'a>(pub &'a [String]);

impl fmt::Display for Argv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_words::join(self.0))
    }
}
