use std::process::{Command, ExitStatus};

use crate::config::Config;
use crate::errors::*;
use crate::extensions::{Argv, CommandExt, OutputExt};
use crate::shell::MessageInfo;

pub const DEFAULT_ESCALATION: &str = "sudo";

/// Result of a finished child process.
///
/// `stdout` and `stderr` are only captured for non-interactive calls.
#[derive(Debug)]
pub struct CallOutput {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub status: ExitStatus,
}

impl CallOutput {
    /// Exit code of the child, `None` if it was killed by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// The process credentials and process launching we depend on.
pub trait System {
    fn effective_uid(&self) -> u32;

    /// Runs `argv` to completion. Interactive calls inherit stdio, others
    /// capture it.
    fn execute(
        &self,
        argv: &[String],
        interactive: bool,
        msg_info: &mut MessageInfo,
    ) -> Result<CallOutput>;

    fn is_root(&self) -> bool {
        self.effective_uid() == 0
    }
}

/// The running host.
#[derive(Debug, Clone, Copy, Default)]
pub struct Host;

impl System for Host {
    fn effective_uid(&self) -> u32 {
        nix::unistd::geteuid().as_raw()
    }

    fn execute(
        &self,
        argv: &[String],
        interactive: bool,
        msg_info: &mut MessageInfo,
    ) -> Result<CallOutput> {
        let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;
        let mut command = Command::new(program);
        command.args(args);

        if interactive {
            let status = command.run_and_get_status(msg_info)?;
            Ok(CallOutput {
                stdout: None,
                stderr: None,
                status,
            })
        } else {
            let output = command.run_and_get_output(msg_info)?;
            Ok(CallOutput {
                stdout: Some(output.stdout_lossy()),
                stderr: Some(output.stderr_lossy()),
                status: output.status,
            })
        }
    }
}

/// Runs `argv` on `system`, returning its exit status verbatim.
pub fn regular_call_with<S: System>(
    system: &S,
    argv: &[String],
    interactive: bool,
    msg_info: &mut MessageInfo,
) -> Result<CallOutput> {
    system.execute(argv, interactive, msg_info)
}

/// Runs `argv` on `system` as root, prefixing `escalation` when the caller
/// is not root already.
///
/// An escalated command is always announced before it runs.
pub fn privileged_call_with<S: System>(
    system: &S,
    escalation: &[String],
    argv: &[String],
    interactive: bool,
    msg_info: &mut MessageInfo,
) -> Result<CallOutput> {
    if system.is_root() {
        return system.execute(argv, interactive, msg_info);
    }

    let call_args = escalation
        .iter()
        .chain(argv)
        .cloned()
        .collect::<Vec<_>>();
    msg_info.disclose(format_args!("!!! about to run `{}`", Argv(&call_args)))?;
    system.execute(&call_args, interactive, msg_info)
}

pub fn regular_call(
    argv: &[String],
    interactive: bool,
    msg_info: &mut MessageInfo,
) -> Result<CallOutput> {
    regular_call_with(&Host, argv, interactive, msg_info)
}

pub fn privileged_call(
    argv: &[String],
    interactive: bool,
    msg_info: &mut MessageInfo,
) -> Result<CallOutput> {
    let escalation = Config::new().escalation()?;
    if !Host.is_root() {
        if let Some(program) = escalation.first() {
            which::which(program)
                .wrap_err_with(|| format!("escalation command `{program}` not found"))
                .with_suggestion(|| {
                    "install sudo, or set ABCROSS_ESCALATION to another escalation command"
                })?;
        }
    }
    privileged_call_with(&Host, &escalation, argv, interactive, msg_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{ColorChoice, Verbosity};

    use std::cell::RefCell;
    use std::os::unix::process::ExitStatusExt;

    macro_rules! s {
        ($x:literal) => {
            $x.to_string()
        };
    }

    struct FakeSystem {
        euid: u32,
        code: i32,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl FakeSystem {
        fn new(euid: u32, code: i32) -> Self {
            FakeSystem {
                euid,
                code,
                calls: RefCell::new(vec![]),
            }
        }
    }

    impl System for FakeSystem {
        fn effective_uid(&self) -> u32 {
            self.euid
        }

        fn execute(
            &self,
            argv: &[String],
            interactive: bool,
            _: &mut MessageInfo,
        ) -> Result<CallOutput> {
            self.calls.borrow_mut().push(argv.to_vec());
            let captured = (!interactive).then(String::new);
            Ok(CallOutput {
                stdout: captured.clone(),
                stderr: captured,
                status: ExitStatus::from_raw(self.code << 8),
            })
        }
    }

    fn quiet() -> MessageInfo {
        MessageInfo::from(Verbosity::Quiet)
    }

    #[test]
    fn privileged_call_escalates_non_root() -> Result<()> {
        let system = FakeSystem::new(1000, 0);
        let mut msg_info = quiet();
        let argv = vec![
            s!("mount"),
            s!("--bind"),
            s!("/dev"),
            s!("/var/ab/cross-root/arm64/dev"),
        ];

        privileged_call_with(&system, &[s!("sudo")], &argv, false, &mut msg_info)?;

        let calls = system.calls.into_inner();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], "sudo");
        assert_eq!(&calls[0][1..], argv.as_slice());
        assert!(msg_info.has_noted);
        Ok(())
    }

    // only does work when re-run by `quiet_escalation_is_disclosed_on_stderr`
    #[test]
    fn quiet_escalation_child() -> Result<()> {
        if std::env::var_os("ABCROSS_TEST_DISCLOSURE_CHILD").is_none() {
            return Ok(());
        }
        let system = FakeSystem::new(1000, 0);
        let mut msg_info = MessageInfo::new(ColorChoice::Never, Verbosity::Quiet);
        privileged_call_with(&system, &[s!("sudo")], &[s!("mount")], false, &mut msg_info)?;
        Ok(())
    }

    #[test]
    fn quiet_escalation_is_disclosed_on_stderr() -> Result<()> {
        let mut msg_info = quiet();
        let output = Command::new(std::env::current_exe()?)
            .args(["--exact", "call::tests::quiet_escalation_child", "--nocapture"])
            .env("ABCROSS_TEST_DISCLOSURE_CHILD", "1")
            .env_remove("ABCROSS_DEBUG")
            .run_and_get_output(&mut msg_info)?;

        assert!(output.status.success(), "{}", output.stderr_lossy());
        assert!(
            output
                .stderr_lossy()
                .contains("[abcross] note: !!! about to run `sudo mount`"),
            "{}",
            output.stderr_lossy()
        );
        Ok(())
    }

    #[test]
    fn privileged_call_as_root_is_unmodified() -> Result<()> {
        let system = FakeSystem::new(0, 0);
        let mut msg_info = quiet();
        let argv = vec![s!("chroot"), s!("/var/ab/cross-root/riscv64"), s!("true")];

        privileged_call_with(&system, &[s!("sudo")], &argv, true, &mut msg_info)?;

        assert_eq!(system.calls.into_inner(), vec![argv]);
        assert!(!msg_info.has_noted);
        Ok(())
    }

    #[test]
    fn privileged_call_multiword_escalation() -> Result<()> {
        let system = FakeSystem::new(1000, 0);
        let mut msg_info = quiet();
        let escalation = [s!("doas"), s!("-n")];

        privileged_call_with(&system, &escalation, &[s!("id")], false, &mut msg_info)?;

        assert_eq!(system.calls.into_inner(), vec![vec![s!("doas"), s!("-n"), s!("id")]]);
        Ok(())
    }

    #[test]
    fn exit_status_is_not_interpreted() -> Result<()> {
        let system = FakeSystem::new(1000, 5);
        let mut msg_info = quiet();

        let escalation = [s!("sudo")];
        let output = privileged_call_with(&system, &escalation, &[s!("false")], false, &mut msg_info)?;
        assert_eq!(output.code(), Some(5));
        assert!(!output.success());

        let output = regular_call_with(&system, &[s!("false")], true, &mut msg_info)?;
        assert_eq!(output.code(), Some(5));
        assert_eq!(output.stdout, None);
        Ok(())
    }

    #[test]
    fn regular_call_captures_streams() -> Result<()> {
        let mut msg_info = quiet();
        let argv = [s!("sh"), s!("-c"), s!("echo out; echo err >&2; exit 2")];

        let output = regular_call(&argv, false, &mut msg_info)?;
        assert_eq!(output.stdout.as_deref(), Some("out\n"));
        assert_eq!(output.stderr.as_deref(), Some("err\n"));
        assert_eq!(output.code(), Some(2));
        Ok(())
    }

    #[test]
    fn regular_call_interactive_inherits() -> Result<()> {
        let mut msg_info = quiet();

        let output = regular_call(&[s!("sh"), s!("-c"), s!("exit 0")], true, &mut msg_info)?;
        assert!(output.success());
        assert_eq!(output.stdout, None);
        assert_eq!(output.stderr, None);
        Ok(())
    }

    #[test]
    fn launch_failure_is_an_error() {
        let mut msg_info = quiet();

        let err = regular_call(&[s!("/nonexistent/abcross-helper")], false, &mut msg_info)
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/abcross-helper"));
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::CouldNotExecute { .. })
        ));

        let err = regular_call(&[], false, &mut msg_info).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::EmptyCommand)
        ));
    }

    #[test]
    fn host_reports_real_euid() {
        assert_eq!(Host.effective_uid(), nix::unistd::geteuid().as_raw());
    }
}
