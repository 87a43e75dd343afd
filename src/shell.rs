// Message output modelled on cargo's shell:
//   https://github.com/rust-lang/cargo/blob/master/src/cargo/core/shell.rs

use std::env;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::config::bool_from_envvar;
use crate::errors::Result;
use owo_colors::{self, OwoColorize};

// get the prefix for stderr messages
macro_rules! abcross_prefix {
    ($s:literal) => {
        concat!("[abcross]", " ", $s)
    };
}

// generate the color style
macro_rules! write_style {
    ($stream:ident, $msg_info:expr, $message:expr $(, $style:ident)* $(,)?) => {{
        match $msg_info.color_choice {
            ColorChoice::Always => write!($stream, "{}", $message $(.$style())*),
            ColorChoice::Never => write!($stream, "{}", $message),
            ColorChoice::Auto => write!(
                $stream,
                "{}",
                $message $(.if_supports_color($stream.owo(), |text| text.$style()))*
            ),
        }?;
    }};
}

// write a status message, which has the following format:
//  "{status}: {message}"
// both status and ':' are bold.
macro_rules! status {
    (@stderr $status:expr, $message:expr, $color:ident, $msg_info:expr $(,)?) => {{
        let mut stream = io::stderr();
        write_style!(stream, $msg_info, $status, bold, $color);
        write_style!(stream, $msg_info, ":", bold);
        if let Some(caller) = $msg_info.caller() {
            write!(stream, " [{}]", caller)?;
        }
        writeln!(stream, " {}", $message)?;

        Ok(())
    }};
}

/// the requested verbosity of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose(u8),
}

impl Verbosity {
    pub fn verbose(self) -> bool {
        match self {
            Self::Verbose(..) => true,
            Self::Normal | Self::Quiet => false,
        }
    }

    fn create(color_choice: ColorChoice, verbose: impl Into<u8>, quiet: bool) -> Self {
        match (verbose.into(), quiet) {
            (1.., true) => {
                MessageInfo::from(color_choice).fatal("cannot set both --verbose and --quiet", 101)
            }
            (v @ 1.., false) => Verbosity::Verbose(v),
            (0, true) => Verbosity::Quiet,
            (0, false) => Verbosity::Normal,
        }
    }
}

/// Whether messages should use color output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    /// force color output
    Always,
    /// force disable color output
    Never,
    /// intelligently guess whether to use color output
    Auto,
}

impl FromStr for ColorChoice {
    type Err = eyre::ErrReport;

    fn from_str(s: &str) -> Result<ColorChoice> {
        match s {
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            "auto" => Ok(ColorChoice::Auto),
            arg => eyre::bail!(
                "argument for --color must be auto, always, or never, but found `{arg}`"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub color_choice: ColorChoice,
    pub verbosity: Verbosity,
    pub debug_locations: bool,
    pub has_warned: bool,
    pub has_noted: bool,
}

impl MessageInfo {
    pub fn new(color_choice: ColorChoice, verbosity: Verbosity) -> MessageInfo {
        MessageInfo {
            color_choice,
            verbosity,
            debug_locations: env::var("ABCROSS_DEBUG")
                .as_deref()
                .map(bool_from_envvar)
                .unwrap_or_default(),
            has_warned: false,
            has_noted: false,
        }
    }

    pub fn create(verbose: impl Into<u8>, quiet: bool, color: Option<&str>) -> Result<MessageInfo> {
        let color_choice = match color {
            Some(arg) => arg.parse()?,
            None => ColorChoice::Auto,
        };
        let verbosity = Verbosity::create(color_choice, verbose, quiet);

        Ok(Self::new(color_choice, verbosity))
    }

    #[track_caller]
    pub fn caller(&mut self) -> Option<impl fmt::Display> {
        if self.debug_locations {
            let loc = std::panic::Location::caller();
            Some(format!("{}:{}", loc.file(), loc.line()))
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity.verbose()
    }

    /// prints a red 'error' message and terminates.
    #[track_caller]
    pub fn fatal<T: fmt::Display>(&mut self, message: T, code: i32) -> ! {
        self.error(message)
            .expect("could not display fatal message");
        std::process::exit(code);
    }

    /// prints a red 'error' message.
    #[track_caller]
    pub fn error<T: fmt::Display>(&mut self, message: T) -> Result<()> {
        self.has_warned = true;
        status!(@stderr abcross_prefix!("error"), &message, red, self)
    }

    /// prints an amber 'warning' message.
    #[track_caller]
    pub fn warn<T: fmt::Display>(&mut self, message: T) -> Result<()> {
        self.has_warned = true;
        match self.verbosity {
            Verbosity::Quiet => Ok(()),
            _ => status!(@stderr abcross_prefix!("warning"), &message, yellow, self),
        }
    }

    /// prints a cyan 'note' message, even when quiet.
    ///
    /// Used for anything the user must see before it happens.
    #[track_caller]
    pub fn disclose<T: fmt::Display>(&mut self, message: T) -> Result<()> {
        self.has_noted = true;
        status!(@stderr abcross_prefix!("note"), &message, cyan, self)
    }

    /// prints a high-priority message to stdout.
    pub fn print<T: fmt::Display>(&mut self, message: T) -> Result<()> {
        println!("{}", message);
        Ok(())
    }

    /// prints a debugging message to stdout.
    pub fn debug<T: fmt::Display>(&mut self, message: T) -> Result<()> {
        match self.verbosity {
            Verbosity::Quiet | Verbosity::Normal => Ok(()),
            _ => {
                println!("{}", message);
                Ok(())
            }
        }
    }

    /// Returns true if we've previously warned or errored, and we're in CI or `ABCROSS_NO_WARNINGS` has been set.
    pub fn should_fail(&self) -> bool {
        env::var("ABCROSS_NO_WARNINGS")
            .map_or_else(|_| is_ci::cached(), |env| bool_from_envvar(&env))
            && self.has_warned
    }
}

impl Default for MessageInfo {
    fn default() -> MessageInfo {
        MessageInfo::new(ColorChoice::Auto, Verbosity::Normal)
    }
}

impl From<ColorChoice> for MessageInfo {
    fn from(color_choice: ColorChoice) -> MessageInfo {
        MessageInfo::new(color_choice, Verbosity::Normal)
    }
}

impl From<Verbosity> for MessageInfo {
    fn from(verbosity: Verbosity) -> MessageInfo {
        MessageInfo::new(ColorChoice::Auto, verbosity)
    }
}

pub trait Stream {
    const OWO: owo_colors::Stream;

    fn owo(&self) -> owo_colors::Stream {
        Self::OWO
    }
}

impl Stream for io::Stderr {
    const OWO: owo_colors::Stream = owo_colors::Stream::Stderr;
}

pub fn default_ident() -> usize {
    abcross_prefix!("").len()
}

/// Indents every line of `message`, keeping line breaks.
#[must_use]
pub fn indent(message: &str, spaces: usize) -> String {
    use std::fmt::Write as _;
    message.lines().fold(String::new(), |mut string, line| {
        let _ = writeln!(string, "{:spaces$}{line}", "");
        string
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_choice_parse() {
        assert_eq!("always".parse::<ColorChoice>().unwrap(), ColorChoice::Always);
        assert_eq!("never".parse::<ColorChoice>().unwrap(), ColorChoice::Never);
        assert_eq!("auto".parse::<ColorChoice>().unwrap(), ColorChoice::Auto);
        assert!("sometimes".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn disclosure_is_recorded_when_quiet() {
        let mut msg_info = MessageInfo::new(ColorChoice::Never, Verbosity::Quiet);
        assert!(!msg_info.has_noted);
        msg_info.disclose("about to run `true`").unwrap();
        assert!(msg_info.has_noted);
        assert!(!msg_info.has_warned);
    }

    #[test]
    fn indent_keeps_lines() {
        assert_eq!(indent("enabled\ninterpreter /x", 2), "  enabled\n  interpreter /x\n");
    }
}
