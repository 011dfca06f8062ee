use crate::object::Object;
use crate::session::{PipelineError, Session};
use std::io::{self, BufRead, Write};

const PROMPT: &str = ">> ";

/// Reads one line at a time from `input` and evaluates it in a single
/// session until end of input. With `disassemble` set, each compiled line is
/// listed before it runs.
pub fn start<R: BufRead, W: Write>(mut input: R, output: W, disassemble: bool) -> io::Result<()> {
    let mut session = Session::with_output(output);
    let mut line = String::new();

    loop {
        write!(session.output_mut(), "{}", PROMPT)?;
        session.output_mut().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let result = match session.compile(&line) {
            Ok(bytecode) => {
                if disassemble {
                    write!(session.output_mut(), "{}", bytecode.instructions)?;
                }
                session.run(bytecode)
            }
            Err(err) => Err(err),
        };

        let out = session.output_mut();
        match result {
            Ok(Object::Null) => {}
            Ok(value) => writeln!(out, "{}", value)?,
            Err(PipelineError::Parse { errors }) => {
                for err in errors {
                    writeln!(out, "\t{}", err)?;
                }
            }
            Err(PipelineError::Compile { source }) => {
                writeln!(out, "Woops! Compilation failed:\n {}", source)?
            }
            Err(PipelineError::Runtime { source }) => {
                writeln!(out, "Woops! Executing bytecode failed:\n {}", source)?
            }
        }
    }
}
