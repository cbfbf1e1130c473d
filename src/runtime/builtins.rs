use std::io::{self, Write};

use phf::phf_map;

use crate::runtime::value::Value;
use crate::runtime::vm::Fault;

/// A method provided by the runtime itself rather than a compiled image.
pub struct BuiltinInfo {
    pub name: &'static str,
    pub min_args: u8,
    pub max_args: u8,
    pub run: fn(&[Value]) -> Result<Value, Fault>,
}

/// Indexed by the operand of `CallBuiltin`.
pub static BUILTINS: &[BuiltinInfo] = &[
    BuiltinInfo {
        name: "Console.WriteLine",
        min_args: 0,
        max_args: 1,
        run: builtin_console_write_line,
    },
    BuiltinInfo {
        name: "Console.Write",
        min_args: 1,
        max_args: 1,
        run: builtin_console_write,
    },
];

/// Base-namespace method names to their `BUILTINS` index.
pub static BUILTIN_IDS: phf::Map<&'static str, u8> = phf_map! {
    "Console.WriteLine" => 0,
    "Console.Write" => 1,
};

fn builtin_console_write_line(args: &[Value]) -> Result<Value, Fault> {
    let mut out = io::stdout().lock();
    match args {
        [] => writeln!(out),
        [value] => writeln!(out, "{value}"),
        _ => panic!("[INTERNAL ERR] Builtin invoked with unchecked arity."),
    }
    .map_err(Fault::Output)?;

    Ok(Value::Unit)
}

fn builtin_console_write(args: &[Value]) -> Result<Value, Fault> {
    let mut out = io::stdout().lock();
    match args {
        [value] => write!(out, "{value}"),
        _ => panic!("[INTERNAL ERR] Builtin invoked with unchecked arity."),
    }
    .map_err(Fault::Output)?;

    Ok(Value::Unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_agree_with_the_table() {
        for (name, &id) in BUILTIN_IDS.entries() {
            assert_eq!(BUILTINS[id as usize].name, *name);
        }
        assert_eq!(BUILTIN_IDS.len(), BUILTINS.len());
    }
}
