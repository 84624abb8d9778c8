//! Runtime objects that can be invoked: native functions, user functions
//! (closures and bound methods) and classes, plus class instances.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{EnkelError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Signature of a host function exposed to scripts. Errors are plain
/// messages; the interpreter attaches the call site's line.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

/// Anything invocable with a fixed arity.
#[derive(Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<Function>),
    Class(Rc<Class>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invoke with already evaluated arguments. The caller has checked the
    /// arity; `line` is the call site, used for native failures.
    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>, line: usize) -> Result<Value> {
        match self {
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(interpreter, &args).map_err(|msg| EnkelError::runtime(line, msg))
            }
            Callable::Function(function) => function.call(interpreter, args),
            Callable::Class(class) => Class::instantiate(class, interpreter, args),
        }
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "[native func {}]", native.name),
            Callable::Function(function) => write!(f, "[func {}]", function.name()),
            Callable::Class(class) => write!(f, "[class {}]", class.name),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A user‑defined function: its declaration plus the environment it closes
/// over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_constructor: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_constructor: bool) -> Self {
        Self {
            declaration,
            closure,
            is_constructor,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
        let env: EnvRef = Environment::with_enclosing(Rc::clone(&self.closure)).into_ref();

        for (param, arg) in self.declaration.params.iter().zip(args) {
            env.borrow_mut().define(&param.lexeme, arg, param.line)?;
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, env)?;

        if self.is_constructor {
            return Environment::get_at(&self.closure, 0, "this", self.declaration.name.line);
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
        }
    }

    /// A copy of this function whose closure gains one layer defining `this`.
    /// The original function is left untouched.
    pub fn bind(&self, instance: Rc<Instance>) -> Result<Function> {
        let mut env = Environment::with_enclosing(Rc::clone(&self.closure));
        env.define("this", Value::Instance(instance), self.declaration.name.line)?;

        Ok(Function {
            declaration: Rc::clone(&self.declaration),
            closure: env.into_ref(),
            is_constructor: self.is_constructor,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes and instances
// ─────────────────────────────────────────────────────────────────────────────

pub struct Class {
    pub name: String,
    methods: HashMap<String, Function>,
}

impl Class {
    pub const CONSTRUCTOR: &'static str = "constructor";

    pub fn new(name: String, methods: HashMap<String, Function>) -> Self {
        Self { name, methods }
    }

    pub fn find_method(&self, name: &str) -> Option<&Function> {
        self.methods.get(name)
    }

    pub fn arity(&self) -> usize {
        self.find_method(Self::CONSTRUCTOR)
            .map_or(0, Function::arity)
    }

    /// Allocate an instance and run the constructor, if any, on it. The
    /// constructor's own result is discarded.
    pub fn instantiate(class: &Rc<Class>, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
        let instance: Rc<Instance> = Rc::new(Instance::new(Rc::clone(class)));

        if let Some(constructor) = class.find_method(Self::CONSTRUCTOR) {
            debug!("Running constructor of class '{}'", class.name);
            constructor
                .bind(Rc::clone(&instance))?
                .call(interpreter, args)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Field if present, otherwise a method bound to this instance.
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        match self.class.find_method(&name.lexeme) {
            Some(method) => {
                let bound: Function = method.bind(Rc::clone(self))?;
                Ok(Value::Callable(Callable::Function(Rc::new(bound))))
            }
            None => Err(EnkelError::runtime(
                name.line,
                format!(
                    "Can't access the property {} of class {}",
                    name.lexeme, self.class.name
                ),
            )),
        }
    }

    /// Insert or overwrite a field.
    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} class instance]", self.class.name)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // fields may point back at this instance
        write!(f, "{}", self)
    }
}
