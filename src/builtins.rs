use crate::code::Opcode;
use crate::object::{Object, NULL};
use crate::vm::VmError;
use std::io::Write;
use strum_macros::{Display, EnumString};

/// The only callable names in the language. Each compiles to its own opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    Puts,
    Atoi,
}

impl Builtin {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Puts => Opcode::CallBuiltin,
            Self::Atoi => Opcode::CallAtoi,
        }
    }
}

/// Writes each argument on its own line.
pub fn puts<W: Write>(args: &[Object], out: &mut W) -> Result<Object, VmError> {
    for arg in args {
        writeln!(out, "{}", arg).map_err(|err| VmError::Output {
            message: err.to_string(),
        })?;
    }
    Ok(NULL)
}

pub fn atoi(args: Vec<Object>) -> Result<Object, VmError> {
    if args.len() != 1 {
        return Err(VmError::WrongArgumentCount {
            name: Builtin::Atoi,
            expected: 1,
            found: args.len(),
        });
    }

    match args.into_iter().next() {
        Some(Object::String(s)) => s
            .parse::<i64>()
            .map(Object::Integer)
            .map_err(|_| VmError::InvalidInteger { input: s }),
        Some(obj) => Err(VmError::UnsupportedArgType {
            name: Builtin::Atoi,
            type_name: obj.type_name(),
        }),
        None => Ok(NULL),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_lookup() {
        assert_eq!(Builtin::from_str("puts"), Ok(Builtin::Puts));
        assert_eq!(Builtin::from_str("atoi"), Ok(Builtin::Atoi));
        assert!(Builtin::from_str("len").is_err());
        assert_eq!(Builtin::Atoi.to_string(), "atoi");
        assert_eq!(Builtin::Puts.opcode(), Opcode::CallBuiltin);
    }

    #[test]
    fn test_puts() {
        let mut out = Vec::new();
        let result = puts(&[Object::from("hi"), 3.into(), true.into(), NULL], &mut out);

        assert_eq!(result, Ok(NULL));
        assert_eq!(String::from_utf8(out).unwrap(), "hi\n3\ntrue\nnull\n");
    }

    #[test]
    fn test_atoi() {
        let cases = vec![
            (vec![Object::from("42")], Ok(Object::Integer(42))),
            (vec![Object::from("-7")], Ok(Object::Integer(-7))),
            (
                vec![Object::from("not a number")],
                Err(VmError::InvalidInteger {
                    input: "not a number".to_owned(),
                }),
            ),
            (
                vec![Object::from("")],
                Err(VmError::InvalidInteger {
                    input: "".to_owned(),
                }),
            ),
            (
                vec![Object::Integer(1)],
                Err(VmError::UnsupportedArgType {
                    name: Builtin::Atoi,
                    type_name: "INTEGER",
                }),
            ),
            (
                vec![],
                Err(VmError::WrongArgumentCount {
                    name: Builtin::Atoi,
                    expected: 1,
                    found: 0,
                }),
            ),
        ];

        for (args, expected) in cases {
            assert_eq!(atoi(args), expected);
        }
    }
}
