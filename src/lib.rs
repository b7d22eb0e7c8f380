//! A tiny command-tree shell.
//!
//! This crate executes a parsed shell command line represented as a binary
//! tree: leaves are simple commands, internal nodes join two subtrees with
//! one of five operators (`;`, `&`, `|`, `&&`, `||`). The evaluator decides
//! how each node maps onto OS processes, wires up standard streams, applies
//! redirections and reports an exit status, with one process per concurrently
//! running branch, blocking waits, no job control.
//!
//! The bundled [`lexer`] and [`parser`] build trees from command lines; the
//! [`evaluate`] entry point walks them.
//!
//! ```no_run
//! use minish::{evaluate, lexer, parser};
//!
//! let tokens = lexer::split_into_tokens("true && false").unwrap();
//! let tree = parser::construct_tree(tokens).unwrap().unwrap();
//! assert_eq!(evaluate(&tree), 1);
//! ```

mod builtin;
pub mod command;
pub mod env;
pub mod error;
mod exec;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod redirect;
pub mod word;

pub use command::{CommandNode, ExitCode, Operator, SimpleCommand, Word, WordPart};
pub use error::ShellError;
pub use interpreter::evaluate;
