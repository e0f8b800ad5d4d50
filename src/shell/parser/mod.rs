pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use lexer::tokenize;
pub use parser::Parser;
