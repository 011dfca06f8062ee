mod symbol;

use crate::ast::{Expression, Node, Operator, Statement};
use crate::builtins::Builtin;
use crate::code::{self, BytecodeError, Instructions, Opcode};
use crate::object::Object;
use crate::vm::GLOBALS_SIZE;
use custom_error::custom_error;
use std::str::FromStr;
use tracing::debug;

pub use symbol::{Symbol, SymbolTable};

pub const MAX_CONSTANTS: usize = 65536;
pub const MAX_ARGUMENTS: usize = 255;

const PLACEHOLDER: usize = 9999;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub CompileError

    InvalidBytecode{source: BytecodeError} = "invalid bytecode: {source}",
    UnknownOperator{op: Operator} = "unknown operator {op}",
    UndefinedIdentifier{name: String} = "undefined variable {name}",
    UnknownFunction{name: String} = "unknown function {name}",
    TooManyConstants{limit: usize} = "too many constants (limit {limit})",
    TooManyGlobals{limit: usize} = "too many global bindings (limit {limit})",
    TooManyArguments{name: Builtin, count: usize} = "{name} called with {count} arguments, at most 255 allowed",
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedInstruction {
    pub opcode: Opcode,
    pub position: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    instructions: Instructions,
    constants: Vec<Object>,

    symbol_table: SymbolTable,

    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

/// What survives between compilations in an interactive session.
#[derive(Debug, Default, Clone)]
pub struct CompilerState {
    constants: Vec<Object>,
    symbol_table: SymbolTable,
}

impl From<CompilerState> for Compiler {
    fn from(state: CompilerState) -> Self {
        Self {
            constants: state.constants,
            symbol_table: state.symbol_table,
            ..Default::default()
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn save_state(&self) -> CompilerState {
        CompilerState {
            constants: self.constants.clone(),
            symbol_table: self.symbol_table.clone(),
        }
    }

    pub fn compile(&mut self, node: Node) -> Result<(), CompileError> {
        match node {
            Node::Program(p) => {
                for stmt in p.statements {
                    self.compile(stmt.into())?;
                }
                debug!(
                    bytes = self.instructions.len(),
                    constants = self.constants.len(),
                    globals = self.symbol_table.num_definitions,
                    "compiled program"
                );
            }
            Node::Statement(stmt) => match stmt {
                Statement::Expr(e) => {
                    self.compile(e.expression.into())?;
                    self.emit(Opcode::Pop, &[])?;
                }
                Statement::Block(block) => {
                    for stmt in block.statements {
                        self.compile(stmt.into())?;
                    }
                }
                Statement::Let(let_stmt) => {
                    self.compile(let_stmt.value.into())?;

                    let symbol = self.symbol_table.define(&let_stmt.name.value);
                    if symbol.index >= GLOBALS_SIZE {
                        return Err(CompileError::TooManyGlobals {
                            limit: GLOBALS_SIZE,
                        });
                    }
                    self.emit(Opcode::SetGlobal, &[symbol.index])?;
                }
            },
            Node::Expression(expr) => match expr {
                Expression::Identifier(ident) => match self.symbol_table.resolve(&ident.value) {
                    Some(symbol) => {
                        self.emit(Opcode::GetGlobal, &[symbol.index])?;
                    }
                    None => {
                        return Err(CompileError::UndefinedIdentifier { name: ident.value });
                    }
                },
                Expression::Infix(infix) => {
                    self.compile((*infix.left).into())?;
                    self.compile((*infix.right).into())?;

                    let opcode = match infix.operator {
                        Operator::Plus => Opcode::Add,
                        Operator::Minus => Opcode::Sub,
                        Operator::Asterisk => Opcode::Mul,
                        Operator::Slash => Opcode::Div,
                        Operator::GT => Opcode::GreaterThan,
                        Operator::LT => Opcode::LessThan,
                        Operator::Eq => Opcode::Equal,
                        Operator::NotEq => Opcode::NotEqual,
                        op => return Err(CompileError::UnknownOperator { op }),
                    };
                    self.emit(opcode, &[])?;
                }
                Expression::Prefix(prefix) => {
                    self.compile((*prefix.right).into())?;

                    let opcode = match prefix.operator {
                        Operator::Bang => Opcode::Bang,
                        Operator::Minus => Opcode::Minus,
                        op => return Err(CompileError::UnknownOperator { op }),
                    };
                    self.emit(opcode, &[])?;
                }
                Expression::IntegerLiteral(int) => {
                    let constant = self.add_constant(int.value.into())?;
                    self.emit(Opcode::Constant, &[constant])?;
                }
                Expression::String(s) => {
                    let constant = self.add_constant(s.value.into())?;
                    self.emit(Opcode::Constant, &[constant])?;
                }
                Expression::Boolean(b) => {
                    if b.value {
                        self.emit(Opcode::True, &[])?;
                    } else {
                        self.emit(Opcode::False, &[])?;
                    }
                }
                Expression::Null(_) => {
                    self.emit(Opcode::Null, &[])?;
                }
                Expression::Call(c) => {
                    let builtin = Builtin::from_str(&c.function.value).map_err(|_| {
                        CompileError::UnknownFunction {
                            name: c.function.value.clone(),
                        }
                    })?;

                    let arg_count = c.arguments.len();
                    if arg_count > MAX_ARGUMENTS {
                        return Err(CompileError::TooManyArguments {
                            name: builtin,
                            count: arg_count,
                        });
                    }
                    for arg in c.arguments {
                        self.compile(arg.into())?;
                    }

                    self.emit(builtin.opcode(), &[arg_count])?;
                }
                Expression::If(expr) => {
                    self.compile((*expr.condition).into())?;

                    let jump_not_truthy_pos = self.emit(Opcode::JumpNotTruthy, &[PLACEHOLDER])?;

                    self.compile_branch(Statement::Block(expr.consequence))?;

                    let jump_pos = self.emit(Opcode::Jump, &[PLACEHOLDER])?;
                    let after_consequence_pos = self.instructions.len();
                    self.change_operand(jump_not_truthy_pos, after_consequence_pos)?;

                    match expr.alternative {
                        Some(alt) => self.compile_branch(Statement::Block(alt))?,
                        None => {
                            self.emit(Opcode::Null, &[])?;
                        }
                    };

                    let after_alternative_pos = self.instructions.len();
                    self.change_operand(jump_pos, after_alternative_pos)?;
                }
            },
        }

        Ok(())
    }

    /// Compiles one arm of a conditional so that it leaves exactly one value
    /// on the stack: the value of its trailing expression, or null.
    fn compile_branch(&mut self, block: Statement) -> Result<(), CompileError> {
        let start = self.instructions.len();
        self.compile(block.into())?;

        if self.instructions.len() > start && self.last_instruction_is(Opcode::Pop) {
            self.remove_last_pop();
        } else {
            self.emit(Opcode::Null, &[])?;
        }
        Ok(())
    }

    pub fn add_constant(&mut self, obj: Object) -> Result<usize, CompileError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(CompileError::TooManyConstants {
                limit: MAX_CONSTANTS,
            });
        }
        self.constants.push(obj);
        Ok(self.constants.len() - 1)
    }

    pub fn emit(&mut self, op: Opcode, operands: &[usize]) -> Result<usize, CompileError> {
        let ins = code::make(op, operands)?;
        let pos = self.add_instruction(ins);

        self.set_last_instruction(op, pos);
        Ok(pos)
    }

    fn add_instruction(&mut self, ins: Instructions) -> usize {
        let pos = self.instructions.len();
        self.instructions.append(ins);
        pos
    }

    fn set_last_instruction(&mut self, opcode: Opcode, position: usize) {
        self.previous_instruction = self.last_instruction;
        self.last_instruction = Some(EmittedInstruction { opcode, position });
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        matches!(self.last_instruction, Some(last) if last.opcode == op)
    }

    fn remove_last_pop(&mut self) {
        if let Some(last) = self.last_instruction {
            self.instructions.truncate(last.position);
            self.last_instruction = self.previous_instruction;
        }
    }

    fn change_operand(&mut self, pos: usize, operand: usize) -> Result<(), CompileError> {
        let op = code::lookup(self.instructions[pos])?;
        let ins = code::make(op, &[operand])?;
        self.instructions.replace_instruction(pos, ins);
        Ok(())
    }

    pub fn bytecode(self) -> Bytecode {
        Bytecode {
            instructions: self.instructions,
            constants: self.constants,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Object>,
}
