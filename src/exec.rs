//! Execution of a single simple command.
//!
//! Assignment and the status-only built-ins resolve entirely in the shell
//! process. Everything else forks: the child applies redirection and either
//! replaces its image or, for `cd`, exits immediately; the parent waits and
//! re-applies `cd` on its own side, because the child's directory change
//! dies with the child.

use std::ffi::CString;
use std::fs::File;
use std::io::Write;
use std::mem::ManuallyDrop;
use std::os::fd::{FromRawFd, RawFd};

use nix::libc::{STDERR_FILENO, STDOUT_FILENO};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork};

use crate::builtin::{self, Builtin};
use crate::command::{ExitCode, SimpleCommand, WordPart};
use crate::env;
use crate::error::ShellError;
use crate::interpreter::ExecContext;
use crate::redirect;
use crate::word;

/// Run one simple command and return its exit status.
///
/// Statuses follow shell conventions: 0 for success, 1 for a structurally
/// invalid command (no verb) or any recoverable failure, the child's own
/// status for external programs, and -1 when the OS refuses to fork.
pub(crate) fn run_simple(cmd: &SimpleCommand, ctx: &ExecContext) -> ExitCode {
    if cmd.verb.is_empty() {
        log::debug!(
            "rejecting simple command without a verb (level {}, under {})",
            ctx.level,
            ctx.enclosing_tag()
        );
        return 1;
    }

    // `FOO=bar`: the verb word itself encodes the assignment. Checked before
    // any builtin or exec handling.
    if let Some(status) = try_assignment(cmd) {
        return status;
    }

    let verb = word::resolve(&cmd.verb);
    log::trace!(
        "simple command '{}' (level {}, under {})",
        verb,
        ctx.level,
        ctx.enclosing_tag()
    );

    match builtin::classify(&verb) {
        Some(Builtin::Exit) => std::process::exit(0),
        Some(Builtin::True) => return 0,
        Some(Builtin::False) => return 1,
        // `cd` forks like an external command so that redirections attached
        // to it are applied and undone without touching the shell's own
        // streams; the directory change that matters happens after the wait.
        Some(Builtin::Cd) | None => {}
    }

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let status = child_exec(cmd, &verb);
            std::process::exit(status);
        }
        Ok(ForkResult::Parent { child }) => {
            let status = wait_for(child);
            if builtin::classify(&verb) == Some(Builtin::Cd)
                && !builtin::change_dir(cmd.params.first())
            {
                return 1;
            }
            status
        }
        Err(errno) => {
            eprintln!("minish: {}", ShellError::ProcessCreation(errno));
            -1
        }
    }
}

/// Detect and perform a variable assignment. Returns `None` when the verb is
/// not of the form `NAME = value...`.
fn try_assignment(cmd: &SimpleCommand) -> Option<ExitCode> {
    let parts = &cmd.verb.parts;
    match (parts.first(), parts.get(1)) {
        (Some(WordPart::Literal(name)), Some(WordPart::Literal(eq))) if eq == "=" => {
            let value = word::resolve_parts(&parts[2..]);
            env::assign(name, &value);
            Some(0)
        }
        _ => None,
    }
}

/// Body of the forked child. Never returns to the evaluator: the caller
/// feeds the result straight into `exit`.
fn child_exec(cmd: &SimpleCommand, verb: &str) -> ExitCode {
    let saved = match redirect::apply(cmd) {
        Ok(saved) => saved,
        Err(err) => {
            write_raw(STDERR_FILENO, &format!("minish: {err}\n"));
            return 1;
        }
    };

    if builtin::classify(verb) == Some(Builtin::Cd) {
        // The change cannot outlive this process; performing it anyway keeps
        // the redirection lifecycle identical to the external-command path.
        builtin::change_dir(cmd.params.first());
        saved.restore();
        return 0;
    }

    if let Ok(argv) = build_argv(cmd, verb) {
        // Only returns on failure.
        let _ = execvp(&argv[0], &argv);
    }
    // Deliberately on stdout, after redirection: the diagnostic lands where
    // the command's output would have gone.
    write_raw(STDOUT_FILENO, &format!("Execution failed for '{verb}'\n"));
    saved.restore();
    1
}

/// Write a diagnostic straight to a standard descriptor.
///
/// The forked child must not go through the process-wide stdio handles:
/// they buffer, and under a test harness they divert into capture buffers
/// that die with the child. Writing the descriptor itself keeps the message
/// on whatever target redirection put there.
fn write_raw(fd: RawFd, msg: &str) {
    let mut out = ManuallyDrop::new(unsafe { File::from_raw_fd(fd) });
    let _ = out.write_all(msg.as_bytes());
}

/// Resolve verb and parameters into an exec-style argument vector.
fn build_argv(cmd: &SimpleCommand, verb: &str) -> Result<Vec<CString>, std::ffi::NulError> {
    let mut argv = Vec::with_capacity(cmd.params.len() + 1);
    argv.push(CString::new(verb)?);
    for param in &cmd.params {
        argv.push(CString::new(word::resolve(param))?);
    }
    Ok(argv)
}

/// Block until `child` terminates and decode its status.
///
/// Signal-terminated children report as `128 + signal`, following the usual
/// shell convention.
pub(crate) fn wait_for(child: Pid) -> ExitCode {
    match waitpid(child, None) {
        Ok(WaitStatus::Exited(_, code)) => code,
        Ok(WaitStatus::Signaled(_, signal, _)) => 128 + signal as i32,
        Ok(_) => 1,
        Err(errno) => {
            eprintln!("minish: {}", ShellError::Sys(errno));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Word;

    fn run(cmd: &SimpleCommand) -> ExitCode {
        run_simple(cmd, &ExecContext::root())
    }

    #[test]
    fn raw_write_reaches_the_descriptor() {
        use std::os::fd::AsRawFd;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("raw.txt");
        let file = File::create(&path).expect("create");
        write_raw(file.as_raw_fd(), "straight through\n");
        drop(file);
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "straight through\n"
        );
    }

    #[test]
    fn missing_verb_is_a_structural_error() {
        assert_eq!(run(&SimpleCommand::default()), 1);
    }

    #[test]
    fn true_and_false_report_their_statuses() {
        assert_eq!(run(&SimpleCommand::new("true", &[])), 0);
        assert_eq!(run(&SimpleCommand::new("false", &[])), 1);
    }

    #[test]
    fn assignment_sets_variable_without_spawning() {
        let _guard = crate::test_lock::lock();
        let cmd = SimpleCommand {
            verb: Word::from_parts(vec![
                WordPart::Literal("MINISH_EXEC_TEST_ASSIGN".to_string()),
                WordPart::Literal("=".to_string()),
                WordPart::Literal("bar".to_string()),
            ]),
            ..SimpleCommand::default()
        };
        assert_eq!(run(&cmd), 0);
        assert_eq!(env::lookup("MINISH_EXEC_TEST_ASSIGN").as_deref(), Some("bar"));
    }

    #[test]
    fn assignment_resolves_references_on_the_right_hand_side() {
        let _guard = crate::test_lock::lock();
        env::assign("MINISH_EXEC_TEST_SRC", "hello");
        let cmd = SimpleCommand {
            verb: Word::from_parts(vec![
                WordPart::Literal("MINISH_EXEC_TEST_DST".to_string()),
                WordPart::Literal("=".to_string()),
                WordPart::Variable("MINISH_EXEC_TEST_SRC".to_string()),
                WordPart::Literal("!".to_string()),
            ]),
            ..SimpleCommand::default()
        };
        assert_eq!(run(&cmd), 0);
        assert_eq!(env::lookup("MINISH_EXEC_TEST_DST").as_deref(), Some("hello!"));
    }

    #[test]
    fn external_exit_status_is_returned_verbatim() {
        assert_eq!(run(&SimpleCommand::new("sh", &["-c", "exit 7"])), 7);
    }

    #[test]
    fn unlaunchable_program_reports_status_one() {
        assert_eq!(run(&SimpleCommand::new("minish-no-such-program", &[])), 1);
    }

    #[test]
    fn cd_to_missing_directory_is_recoverable() {
        let _guard = crate::test_lock::lock();
        let before = std::env::current_dir().expect("cwd");
        assert_eq!(run(&SimpleCommand::new("cd", &["/nonexistent-minish-dir"])), 1);
        assert_eq!(std::env::current_dir().expect("cwd"), before);
    }
}
