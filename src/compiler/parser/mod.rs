mod error;
mod tests;
mod tokenstream;

pub mod parser;
pub mod tree;

pub use error::ParserError;
pub use parser::Parser;
pub use tree::{ParseNode, ParseTree};

pub type ParserResult<T> = Result<T, super::CompilerError<ParserError>>;
