use crate::compiler::{Bytecode, CompileError, Compiler, CompilerState};
use crate::lexer::Lexer;
use crate::object::Object;
use crate::parser::{ParseError, Parser};
use crate::vm::{VmError, VM};
use custom_error::custom_error;
use std::io::{self, Write};
use std::mem;
use tracing::debug;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub PipelineError

    Parse{errors: Vec<ParseError>} = @{ render_parse_errors(errors) },
    Compile{source: CompileError} = "compilation failed: {source}",
    Runtime{source: VmError} = "executing bytecode failed: {source}",
}

fn render_parse_errors(errors: &[ParseError]) -> String {
    let lines: Vec<String> = errors.iter().map(|err| format!("\t{}", err)).collect();
    format!("parser errors:\n{}", lines.join("\n"))
}

/// Runs source text through the whole pipeline while keeping bindings alive
/// between calls. Program output from `puts` goes to `W`.
pub struct Session<W: Write = io::Stdout> {
    state: CompilerState,
    globals: Vec<Object>,
    output: W,
}

impl Session {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Session<W> {
    pub fn with_output(output: W) -> Self {
        Self {
            state: Default::default(),
            globals: Vec::new(),
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    /// Parses and compiles `source` against the bindings seen so far. The
    /// session's compiler state only advances when compilation succeeds.
    pub fn compile(&mut self, source: &str) -> Result<Bytecode, PipelineError> {
        let program = Parser::new(Lexer::new(source))
            .parse_program()
            .map_err(|errors| PipelineError::Parse { errors })?;

        let mut compiler = Compiler::from(self.state.clone());
        compiler.compile(program.into())?;
        self.state = compiler.save_state();

        Ok(compiler.bytecode())
    }

    /// Executes compiled bytecode and returns the value of the last
    /// expression statement. Globals assigned before a runtime error are kept.
    pub fn run(&mut self, bytecode: Bytecode) -> Result<Object, PipelineError> {
        let globals = mem::take(&mut self.globals);
        let mut vm = VM::with_output(bytecode, globals, &mut self.output);

        let result = vm.run();
        let value = vm.last_popped_stack_element().clone();
        self.globals = vm.into_globals();

        if let Err(err) = &result {
            debug!(error = %err, "run aborted");
        }
        result?;
        Ok(value)
    }

    pub fn eval(&mut self, source: &str) -> Result<Object, PipelineError> {
        let bytecode = self.compile(source)?;
        self.run(bytecode)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builtins::Builtin;
    use crate::parser::MAX_NESTING_DEPTH;

    fn session() -> Session<Vec<u8>> {
        Session::with_output(Vec::new())
    }

    #[test]
    fn test_bindings_persist() {
        let mut session = session();

        assert_eq!(session.eval("let a = 1;"), Ok(Object::Null));
        assert_eq!(session.eval("a + 1"), Ok(Object::Integer(2)));
        assert_eq!(session.eval("let b = a * 10; b"), Ok(Object::Integer(10)));
        assert_eq!(session.eval("let a = a + b; a"), Ok(Object::Integer(11)));
    }

    #[test]
    fn test_constants_persist() {
        let mut session = session();

        session.eval("let s = \"first\";").unwrap();
        session.eval("let n = 2;").unwrap();
        assert_eq!(session.eval("s"), Ok(Object::from("first")));
        assert_eq!(session.eval("n + 40"), Ok(Object::Integer(42)));
    }

    #[test]
    fn test_parse_errors() {
        let mut session = session();

        match session.eval("let = 5;") {
            Err(PipelineError::Parse { errors }) => assert!(!errors.is_empty()),
            other => panic!("expected parse errors, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_compile_rolls_back() {
        let mut session = session();

        assert_eq!(
            session.eval("let a = 1; let b = c;"),
            Err(PipelineError::Compile {
                source: CompileError::UndefinedIdentifier {
                    name: "c".to_owned()
                }
            })
        );
        assert!(matches!(
            session.eval("a"),
            Err(PipelineError::Compile { .. })
        ));

        session.eval("let a = 5;").unwrap();
        assert_eq!(session.eval("a"), Ok(Object::Integer(5)));
    }

    #[test]
    fn test_runtime_error_keeps_globals() {
        let mut session = session();

        assert_eq!(
            session.eval("let a = 7; let b = atoi(\"x\");"),
            Err(PipelineError::Runtime {
                source: VmError::InvalidInteger {
                    input: "x".to_owned()
                }
            })
        );
        assert_eq!(session.eval("a"), Ok(Object::Integer(7)));
        assert_eq!(session.eval("b"), Ok(Object::Null));
    }

    #[test]
    fn test_deep_nesting_is_a_parse_error() {
        let mut session = session();
        let source = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));

        match session.eval(&source) {
            Err(PipelineError::Parse { errors }) => assert!(errors.contains(
                &ParseError::NestingTooDeep {
                    limit: MAX_NESTING_DEPTH
                }
            )),
            other => panic!("expected parse errors, got {:?}", other),
        }
        assert_eq!(session.eval("1 + 1"), Ok(Object::Integer(2)));
    }

    #[test]
    fn test_puts_goes_to_output() {
        let mut session = session();

        session.eval("puts(\"hello\"); let x = 3;").unwrap();
        session.eval("puts(x, x > 2)").unwrap();

        assert_eq!(
            String::from_utf8(session.output().clone()).unwrap(),
            "hello\n3\ntrue\n"
        );
    }

    #[test]
    fn test_error_messages() {
        let mut session = session();

        let parse = session.eval("let x 1; let y = 2 +;").unwrap_err();
        assert_eq!(
            parse.to_string(),
            "parser errors:\n\texpected next token to be =, got INT instead\n\tno prefix parse function for ; found"
        );

        let runtime = session.eval("atoi(true)").unwrap_err();
        assert_eq!(
            runtime,
            PipelineError::Runtime {
                source: VmError::UnsupportedArgType {
                    name: Builtin::Atoi,
                    type_name: "BOOLEAN"
                }
            }
        );
        assert_eq!(
            runtime.to_string(),
            "executing bytecode failed: argument to atoi not supported, got BOOLEAN"
        );
    }
}
