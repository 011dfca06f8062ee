pub mod ast;
pub mod builtins;
pub mod code;
pub mod compiler;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;
pub mod session;
pub mod token;
pub mod vm;

pub use compiler::{Bytecode, Compiler};
pub use lexer::Lexer;
pub use object::Object;
pub use parser::Parser;
pub use session::{PipelineError, Session};
pub use vm::VM;
