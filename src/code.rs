use custom_error::custom_error;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;
use strum_macros::{EnumIter, FromRepr};

custom_error! {
    #[derive(Clone, PartialEq)]
    pub BytecodeError

    InvalidOpcode{op: u8} = "opcode {op} undefined",
    OperandCount{op: Opcode, expected: usize, got: usize} = "{op} expects {expected} operands, got {got}",
    OperandOutOfRange{op: Opcode, operand: usize, width: usize} = "operand {operand} of {op} does not fit in {width} bytes",
    Truncated{op: Opcode} = "instruction {op} is truncated",
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(u8)]
pub enum Opcode {
    Constant,
    Add,
    Sub,
    Mul,
    Div,
    True,
    False,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    Minus,
    Bang,
    Pop,
    JumpNotTruthy,
    Jump,
    SetGlobal,
    GetGlobal,
    Null,
    CallBuiltin,
    CallAtoi,
}

impl Opcode {
    /// Byte width of each operand that follows the opcode in the stream.
    pub fn operand_widths(&self) -> &'static [usize] {
        match self {
            Self::Constant | Self::JumpNotTruthy | Self::Jump | Self::SetGlobal | Self::GetGlobal => {
                &[2]
            }
            Self::CallBuiltin | Self::CallAtoi => &[1],
            _ => &[],
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Op{:?}", self)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = BytecodeError;

    fn try_from(op: u8) -> Result<Self, Self::Error> {
        Opcode::from_repr(op).ok_or(BytecodeError::InvalidOpcode { op })
    }
}

pub fn lookup(op: u8) -> Result<Opcode, BytecodeError> {
    Opcode::try_from(op)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instructions(Vec<u8>);

impl Deref for Instructions {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Instructions {
    pub fn append(&mut self, mut other: Instructions) {
        self.0.append(&mut other.0);
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Overwrites the bytes at `pos` in place. The replacement must have the
    /// same length as the instruction it replaces.
    pub fn replace_instruction(&mut self, pos: usize, ins: Instructions) {
        self.0[pos..pos + ins.len()].copy_from_slice(&ins);
    }

    /// Walks the stream from offset 0, yielding each instruction's offset,
    /// opcode and operands.
    pub fn decode(&self) -> Result<Vec<(usize, Opcode, Vec<usize>)>, BytecodeError> {
        let mut decoded = vec![];
        let mut offset = 0;
        while offset < self.len() {
            let op = lookup(self[offset])?;
            let (operands, read) = read_operands(op, &self[offset + 1..])?;
            decoded.push((offset, op, operands));
            offset += 1 + read;
        }
        Ok(decoded)
    }
}

fn fmt_instruction(op: Opcode, operands: &[usize]) -> String {
    let mut text = op.to_string();
    for operand in operands {
        text.push_str(&format!(" {}", operand));
    }
    text
}

impl Display for Instructions {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut offset = 0;
        while offset < self.len() {
            let decoded =
                lookup(self[offset]).and_then(|op| Ok((op, read_operands(op, &self[offset + 1..])?)));
            match decoded {
                Ok((op, (operands, read))) => {
                    writeln!(f, "{:04} {}", offset, fmt_instruction(op, &operands))?;
                    offset += 1 + read;
                }
                Err(err) => {
                    writeln!(f, "{:04} ERROR: {}", offset, err)?;
                    break;
                }
            }
        }
        Ok(())
    }
}

pub fn concat_instructions(instructions: Vec<Instructions>) -> Instructions {
    let mut all = Instructions::default();
    for ins in instructions {
        all.append(ins);
    }
    all
}

/// Encodes one instruction, operands big-endian.
pub fn make(op: Opcode, operands: &[usize]) -> Result<Instructions, BytecodeError> {
    let widths = op.operand_widths();
    if widths.len() != operands.len() {
        return Err(BytecodeError::OperandCount {
            op,
            expected: widths.len(),
            got: operands.len(),
        });
    }

    let mut instruction = vec![op as u8];

    for (&width, &operand) in widths.iter().zip(operands.iter()) {
        let out_of_range = BytecodeError::OperandOutOfRange { op, operand, width };
        match width {
            1 => instruction.push(u8::try_from(operand).map_err(|_| out_of_range)?),
            2 => instruction
                .extend_from_slice(&u16::try_from(operand).map_err(|_| out_of_range)?.to_be_bytes()),
            _ => return Err(out_of_range),
        }
    }

    Ok(instruction.into())
}

/// Decodes the operands of `op` from `ins`, which starts just past the opcode
/// byte. Returns the operands and the number of bytes consumed.
pub fn read_operands(op: Opcode, ins: &[u8]) -> Result<(Vec<usize>, usize), BytecodeError> {
    let widths = op.operand_widths();
    let mut operands = Vec::with_capacity(widths.len());
    let mut offset = 0;

    for &width in widths {
        let bytes = ins
            .get(offset..offset + width)
            .ok_or(BytecodeError::Truncated { op })?;
        operands.push(match width {
            1 => bytes[0] as usize,
            _ => read_u16(bytes) as usize,
        });
        offset += width;
    }

    Ok((operands, offset))
}

pub fn read_u16(ins: &[u8]) -> u16 {
    u16::from_be_bytes([ins[0], ins[1]])
}
