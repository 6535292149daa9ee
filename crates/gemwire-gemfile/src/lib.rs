//! Gemfile mini-parser.
//!
//! Tokenises and evaluates the subset of the Gemfile DSL needed to extract
//! gem requirements: `source`, `ruby`, `gem`, `group`, `platforms`,
//! `gemspec`, `eval_gemfile`, `%w[...]` and array literals, executed under
//! an [`Environment`] that decides which groups and platforms apply.
//!
//! Anything fancier (assignments, conditionals, interpolation) is a syntax
//! error: this is deliberately not a Ruby interpreter.

pub mod env;
pub mod error;
pub mod eval;
pub mod gemfile;
pub mod lexer;
pub mod token;
pub mod value;

pub use env::Environment;
pub use error::GemfileError;
pub use eval::{parse, parse_with};
pub use gemfile::{Gem, Gemfile, Gemspec};
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
pub use value::GemValue;
