//! The fixed native library seeded into every interpreter's globals.

use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, NativeFunction};
use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::value::Value;

const NATIVES: &[(&str, usize, crate::callable::NativeFn)] = &[
    ("Print", 1, print),
    ("Input", 0, input),
    ("IsOdd", 1, is_odd),
    ("IsEven", 1, is_even),
    ("TypeOf", 1, type_of),
];

/// A root environment holding every native function.
pub fn globals() -> Environment {
    NATIVES
        .iter()
        .map(|&(name, arity, func)| {
            debug!("Defining native function '{}'", name);

            let native = Callable::Native(Rc::new(NativeFunction { name, arity, func }));
            (name.to_string(), Value::Callable(native))
        })
        .collect()
}

fn print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    writeln!(interpreter.output(), "{}", args[0]).map_err(|e| format!("Print failed: {}", e))?;

    Ok(Value::None)
}

fn input(interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value, String> {
    interpreter
        .output()
        .flush()
        .map_err(|e| format!("Input failed: {}", e))?;

    let mut line = String::new();
    interpreter
        .input()
        .read_line(&mut line)
        .map_err(|e| format!("Input failed: {}", e))?;

    let trimmed: &str = line.trim_end_matches(['\r', '\n']);

    Ok(Value::String(trimmed.to_string()))
}

fn parity(name: &str, value: &Value) -> Result<bool, String> {
    match value {
        Value::Number(n) => Ok(n % 2.0 == 0.0),
        other => Err(format!("{} expects a number, got {}", name, other)),
    }
}

fn is_even(_interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    parity("IsEven", &args[0]).map(Value::Bool)
}

fn is_odd(_interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    parity("IsOdd", &args[0]).map(|even| Value::Bool(!even))
}

fn type_of(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let name: &str = args[0]
        .type_name()
        .ok_or_else(|| format!("Can't get type of {}", args[0]))?;

    writeln!(interpreter.output(), "{}", name).map_err(|e| format!("TypeOf failed: {}", e))?;

    Ok(Value::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_hold_every_native() {
        let env = globals();

        for &(name, arity, _) in NATIVES {
            match env.get(name, 0) {
                Ok(Value::Callable(native)) => assert_eq!(native.arity(), arity, "{}", name),
                other => panic!("{} is not installed: {:?}", name, other),
            }
        }
    }
}
