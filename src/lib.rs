// Loop language interpreter library
//
// Lexer, precedence-climbing parser and tree-walking evaluator for the Loop
// expression language, with span-carrying diagnostics.

pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod token;
pub mod value;

// Re-export commonly used items
pub use ast::{Conditional, Expr, Scope};
pub use environment::{Binding, Environment};
pub use error::{BufferId, ErrorKind, LoopError, Span};
pub use evaluator::Evaluator;
pub use lexer::{tokenize, Lexer};
pub use parser::{parse, Parser};
pub use token::{Token, TokenKind};
pub use value::{Kind, Value};

pub use repl::start as start_repl;
pub use runner::{evaluate, run, RunOptions};
