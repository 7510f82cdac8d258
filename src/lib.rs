pub mod cli;
pub mod compiler;
pub mod config;
pub mod diagnostics;

pub use compiler::{compile, compile_with, CompileError, Compilation, ErrorClass, Options};
