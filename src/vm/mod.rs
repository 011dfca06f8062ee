
use crate::builtins::{self, Builtin};
use crate::code::{self, BytecodeError, Instructions, Opcode};
use crate::compiler::Bytecode;
use crate::object::{Object, NULL};
use custom_error::custom_error;
use std::io::{self, Write};
use std::mem;
use tracing::{debug, trace};

custom_error! {
    #[derive(Clone, PartialEq)]
    pub VmError

    InvalidBytecode{source: BytecodeError} = "invalid bytecode: {source}",
    StackOverflow = "stack overflow",
    StackUnderflow = "stack underflow",
    UnsupportedBinaryTypes{op: Opcode, left: &'static str, right: &'static str} = "unsupported types for {op}: {left} {right}",
    UnsupportedComparison{op: Opcode, left: &'static str, right: &'static str} = "unsupported comparison {op}: {left} {right}",
    UnsupportedNegation{type_name: &'static str} = "unsupported type for negation: {type_name}",
    DivisionByZero = "division by zero",
    WrongArgumentCount{name: Builtin, expected: usize, found: usize} = "wrong number of arguments to {name}: want={expected}, got={found}",
    UnsupportedArgType{name: Builtin, type_name: &'static str} = "argument to {name} not supported, got {type_name}",
    InvalidInteger{input: String} = "could not parse {input} as integer",
    UndefinedConstant{index: usize} = "constant {index} undefined",
    Output{message: String} = "could not write output: {message}",
}

pub const STACK_SIZE: usize = 2048;
pub const GLOBALS_SIZE: usize = 65536;

pub struct VM<W: Write = io::Stdout> {
    constants: Vec<Object>,
    instructions: Instructions,

    stack: Vec<Object>,
    sp: usize,

    globals: Vec<Object>,

    last_popped: Object,

    output: W,
}

impl VM {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_globals(bytecode, Vec::new())
    }

    pub fn with_globals(bytecode: Bytecode, globals: Vec<Object>) -> Self {
        Self::with_output(bytecode, globals, io::stdout())
    }
}

impl<W: Write> VM<W> {
    /// Builds a machine that writes `puts` output to `output` and starts
    /// from an existing set of globals.
    pub fn with_output(bytecode: Bytecode, globals: Vec<Object>, output: W) -> Self {
        Self {
            constants: bytecode.constants,
            instructions: bytecode.instructions,

            stack: vec![NULL; STACK_SIZE],
            sp: 0,

            globals,

            last_popped: NULL,

            output,
        }
    }

    pub fn run(&mut self) -> Result<(), VmError> {
        let mut ip = 0;
        while ip < self.instructions.len() {
            let op = code::lookup(self.instructions[ip])?;
            let (operands, read) = code::read_operands(op, &self.instructions[ip + 1..])?;
            trace!(ip, %op, ?operands, sp = self.sp, "execute");
            ip += 1 + read;

            match op {
                Opcode::Constant => {
                    let index = operands[0];
                    let constant = self
                        .constants
                        .get(index)
                        .cloned()
                        .ok_or(VmError::UndefinedConstant { index })?;
                    self.push(constant)?;
                }
                Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                    self.execute_binary_operation(op)?;
                }
                Opcode::Equal | Opcode::NotEqual | Opcode::GreaterThan | Opcode::LessThan => {
                    self.execute_comparison(op)?;
                }
                Opcode::Bang => {
                    self.execute_bang_operator()?;
                }
                Opcode::Minus => {
                    self.execute_minus_operator()?;
                }
                Opcode::Pop => {
                    self.last_popped = self.pop()?;
                }
                Opcode::True => self.push(true.into())?,
                Opcode::False => self.push(false.into())?,
                Opcode::Null => self.push(NULL)?,
                Opcode::JumpNotTruthy => {
                    let condition = self.pop()?;

                    if !condition.is_truthy() {
                        ip = operands[0];
                    }
                }
                Opcode::Jump => {
                    ip = operands[0];
                }
                Opcode::SetGlobal => {
                    let index = operands[0];
                    let value = self.pop()?;

                    if index >= self.globals.len() {
                        self.globals.resize(index + 1, NULL);
                    }
                    self.globals[index] = value;
                }
                Opcode::GetGlobal => {
                    let value = self.globals.get(operands[0]).cloned().unwrap_or(NULL);
                    self.push(value)?;
                }
                Opcode::CallBuiltin => {
                    let args = self.pop_arguments(operands[0])?;
                    let result = builtins::puts(&args, &mut self.output)?;
                    self.push(result)?;
                }
                Opcode::CallAtoi => {
                    let args = self.pop_arguments(operands[0])?;
                    let result = builtins::atoi(args)?;
                    self.push(result)?;
                }
            }
        }

        debug!(sp = self.sp, globals = self.globals.len(), "vm halted");
        Ok(())
    }

    fn execute_comparison(&mut self, op: Opcode) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;

        let result = match (op, &left, &right) {
            (Opcode::GreaterThan, Object::Integer(l), Object::Integer(r)) => l > r,
            (Opcode::LessThan, Object::Integer(l), Object::Integer(r)) => l < r,
            (Opcode::Equal, l, r) if mem::discriminant(l) == mem::discriminant(r) => l == r,
            (Opcode::NotEqual, l, r) if mem::discriminant(l) == mem::discriminant(r) => l != r,
            _ => {
                return Err(VmError::UnsupportedComparison {
                    op,
                    left: left.type_name(),
                    right: right.type_name(),
                })
            }
        };

        self.push(result.into())
    }

    fn execute_bang_operator(&mut self) -> Result<(), VmError> {
        let operand = self.pop()?;
        self.push((!operand.is_truthy()).into())
    }

    fn execute_minus_operator(&mut self) -> Result<(), VmError> {
        match self.pop()? {
            Object::Integer(n) => self.push(n.wrapping_neg().into()),
            o => Err(VmError::UnsupportedNegation {
                type_name: o.type_name(),
            }),
        }
    }

    fn execute_binary_operation(&mut self, op: Opcode) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;
        match (left, right) {
            (Object::Integer(l), Object::Integer(r)) => {
                self.execute_binary_integer_operation(op, l, r)
            }
            (l, r) => Err(VmError::UnsupportedBinaryTypes {
                op,
                left: l.type_name(),
                right: r.type_name(),
            }),
        }
    }

    fn execute_binary_integer_operation(
        &mut self,
        op: Opcode,
        left: i64,
        right: i64,
    ) -> Result<(), VmError> {
        let result = match op {
            Opcode::Add => left.wrapping_add(right),
            Opcode::Sub => left.wrapping_sub(right),
            Opcode::Mul => left.wrapping_mul(right),
            Opcode::Div if right == 0 => return Err(VmError::DivisionByZero),
            Opcode::Div => left.wrapping_div(right),
            _ => {
                return Err(VmError::UnsupportedBinaryTypes {
                    op,
                    left: "INTEGER",
                    right: "INTEGER",
                })
            }
        };

        self.push(result.into())
    }

    fn pop_arguments(&mut self, count: usize) -> Result<Vec<Object>, VmError> {
        if count > self.sp {
            return Err(VmError::StackUnderflow);
        }
        let args = self.stack[self.sp - count..self.sp].to_vec();
        self.sp -= count;
        Ok(args)
    }

    fn push(&mut self, obj: Object) -> Result<(), VmError> {
        if self.sp >= STACK_SIZE {
            return Err(VmError::StackOverflow);
        }

        self.stack[self.sp] = obj;
        self.sp += 1;

        Ok(())
    }

    fn pop(&mut self) -> Result<Object, VmError> {
        if self.sp == 0 {
            return Err(VmError::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.stack[self.sp].clone())
    }

    /// The value most recently removed by `OpPop`, or null if no expression
    /// statement has run.
    pub fn last_popped_stack_element(&self) -> &Object {
        &self.last_popped
    }

    pub fn stack_top(&self) -> Option<&Object> {
        self.sp.checked_sub(1).map(|top| &self.stack[top])
    }

    pub fn into_globals(self) -> Vec<Object> {
        self.globals
    }
}
