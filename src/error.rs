//! Error taxonomy of the evaluator.
//!
//! Shells communicate through exit statuses, so most failures never surface
//! as `Err` to the library user; they are reported on the shell's own
//! standard error and folded into the status of the failing command. The
//! typed variants exist at the module seams, where the failure site still
//! knows the path or system call involved.

use std::io;

use nix::errno::Errno;
use thiserror::Error;

/// Failures the evaluator distinguishes beyond a plain non-zero status.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A redirection target could not be opened. Aborts only the command
    /// carrying the redirection, never the whole tree.
    #[error("cannot open redirection target '{path}': {source}")]
    RedirectOpen {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The OS refused to create a new process.
    #[error("cannot create process: {0}")]
    ProcessCreation(#[source] Errno),

    /// A descriptor-level call (dup, dup2, pipe, wait) failed.
    #[error("descriptor operation failed: {0}")]
    Sys(#[from] Errno),
}
