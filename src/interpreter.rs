//! Recursive evaluation of the command tree.
//!
//! [`evaluate`] is the single entry point: it dispatches on the node's
//! operator and composes process creation per operator. Sequencing and the
//! conditionals stay in the calling process; `&` and `|` are the only
//! operators that fork for their branches, one process per concurrently
//! running subtree, each waited for exactly once.

use std::os::fd::AsRawFd;

use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{ForkResult, Pid, dup2, fork, pipe};

use crate::command::{CommandNode, ExitCode, Operator};
use crate::error::ShellError;
use crate::exec::{self, wait_for};

/// Ambient state threaded through recursive evaluation: the nesting depth
/// and the node enclosing the one being evaluated. Diagnostics only; control
/// flow never depends on it.
pub struct ExecContext<'a> {
    pub level: usize,
    pub enclosing: Option<&'a CommandNode>,
}

impl ExecContext<'_> {
    /// Context for a top-level tree.
    pub(crate) fn root() -> ExecContext<'static> {
        ExecContext {
            level: 0,
            enclosing: None,
        }
    }

    pub(crate) fn enclosing_tag(&self) -> &'static str {
        self.enclosing.map(CommandNode::describe).unwrap_or("root")
    }
}

/// Evaluate a command tree and return its exit status.
///
/// The status follows POSIX conventions: 0 means success. The only way this
/// call does not return is the `exit`/`quit` built-in, which terminates the
/// shell process itself.
pub fn evaluate(node: &CommandNode) -> ExitCode {
    eval(node, &ExecContext::root())
}

fn eval(node: &CommandNode, ctx: &ExecContext) -> ExitCode {
    log::trace!(
        "evaluating {} node (level {}, under {})",
        node.describe(),
        ctx.level,
        ctx.enclosing_tag()
    );
    match node {
        CommandNode::Simple(cmd) => exec::run_simple(cmd, ctx),
        CommandNode::Operator { op, left, right } => {
            let inner = ExecContext {
                level: ctx.level + 1,
                enclosing: Some(node),
            };
            match op {
                Operator::Sequence => {
                    // Left's status is deliberately discarded; a failing left
                    // never short-circuits a sequence.
                    let _ = eval(left, &inner);
                    eval(right, &inner)
                }
                Operator::Parallel => run_in_parallel(left, right, &inner),
                Operator::Pipe => run_on_pipe(left, right, &inner),
                Operator::IfZero => {
                    let status = eval(left, &inner);
                    if status == 0 { eval(right, &inner) } else { status }
                }
                Operator::IfNonZero => {
                    let status = eval(left, &inner);
                    if status != 0 { eval(right, &inner) } else { status }
                }
            }
        }
    }
}

/// Fork a child that evaluates `node` to completion and exits with its
/// status.
fn spawn_eval(node: &CommandNode, ctx: &ExecContext) -> nix::Result<Pid> {
    match unsafe { fork()? } {
        ForkResult::Child => {
            let status = eval(node, ctx);
            std::process::exit(status);
        }
        ForkResult::Parent { child } => Ok(child),
    }
}

/// `left & right`: one child per branch, both reaped before returning.
///
/// The operator's contract is a fixed success: neither branch's status is
/// propagated.
fn run_in_parallel(left: &CommandNode, right: &CommandNode, ctx: &ExecContext) -> ExitCode {
    let first = match spawn_eval(left, ctx) {
        Ok(pid) => pid,
        Err(errno) => {
            eprintln!("minish: {}", ShellError::ProcessCreation(errno));
            return -1;
        }
    };
    match spawn_eval(right, ctx) {
        Ok(second) => {
            wait_for(first);
            wait_for(second);
            0
        }
        Err(errno) => {
            eprintln!("minish: {}", ShellError::ProcessCreation(errno));
            wait_for(first);
            -1
        }
    }
}

/// `left | right`: a unidirectional channel from left's standard output to
/// right's standard input. Returns the right branch's status.
fn run_on_pipe(left: &CommandNode, right: &CommandNode, ctx: &ExecContext) -> ExitCode {
    let (read_end, write_end) = match pipe() {
        Ok(ends) => ends,
        Err(errno) => {
            eprintln!("minish: {}", ShellError::Sys(errno));
            return 1;
        }
    };

    let first = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            drop(read_end);
            let status = match dup2(write_end.as_raw_fd(), STDOUT_FILENO) {
                Ok(_) => {
                    drop(write_end);
                    eval(left, ctx)
                }
                Err(errno) => {
                    eprintln!("minish: {}", ShellError::Sys(errno));
                    1
                }
            };
            std::process::exit(status);
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(errno) => {
            eprintln!("minish: {}", ShellError::ProcessCreation(errno));
            return -1;
        }
    };

    let second = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            drop(write_end);
            let status = match dup2(read_end.as_raw_fd(), STDIN_FILENO) {
                Ok(_) => {
                    drop(read_end);
                    eval(right, ctx)
                }
                Err(errno) => {
                    eprintln!("minish: {}", ShellError::Sys(errno));
                    1
                }
            };
            std::process::exit(status);
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(errno) => {
            // The writer is already running; close our ends so it can
            // terminate on EPIPE/EOF, then reap it.
            drop(read_end);
            drop(write_end);
            eprintln!("minish: {}", ShellError::ProcessCreation(errno));
            wait_for(first);
            return -1;
        }
    };

    // Both ends must close here, or the right child never sees EOF.
    drop(read_end);
    drop(write_end);

    wait_for(first);
    wait_for(second)
}
