use crate::error::{EnkelError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to one binding layer. Closures, call frames and nested
/// blocks all hold these; the layer lives as long as its longest holder.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One layer of name → value bindings, chained to an enclosing layer.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap in a fresh shared handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this layer. A name may be defined only once per layer.
    pub fn define(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            return Err(EnkelError::runtime(
                line,
                format!("Attempt to redefine identifier: {}", name),
            ));
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(EnkelError::runtime(
                line,
                format!("Undefined variable: {}", name),
            ))
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(EnkelError::runtime(
                line,
                format!("Variable '{}' is not defined", name),
            ))
        }
    }

    /// Read `name` exactly `distance` layers up from `env`.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str, line: usize) -> Result<Value> {
        let target: EnvRef = Self::ancestor(env, distance, line)?;
        let layer = target.borrow();

        layer.values.get(name).cloned().ok_or_else(|| {
            EnkelError::runtime(line, format!("Undefined variable: {}", name))
        })
    }

    /// Overwrite `name` exactly `distance` layers up from `env`.
    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let target: EnvRef = Self::ancestor(env, distance, line)?;
        let mut layer = target.borrow_mut();

        match layer.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EnkelError::runtime(
                line,
                format!("Variable '{}' is not defined", name),
            )),
        }
    }

    fn ancestor(env: &EnvRef, distance: usize, line: usize) -> Result<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = current.borrow().enclosing.clone().ok_or_else(|| {
                EnkelError::runtime(
                    line,
                    format!("No environment {} scope(s) up", distance),
                )
            })?;
            current = next;
        }

        Ok(current)
    }

    /// Drop every binding in this layer, keeping the layer itself (and its
    /// link outward) alive for whoever shares it.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

impl FromIterator<(String, Value)> for Environment {
    /// A root layer pre-filled with `bindings`; later duplicates win.
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(bindings: I) -> Self {
        Environment {
            values: bindings.into_iter().collect(),
            enclosing: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            other => panic!("expected a number, got {}", other),
        }
    }

    #[test]
    fn define_twice_in_one_layer_fails() {
        let mut env = Environment::new();

        env.define("x", Value::Number(1.0), 1).unwrap();
        let err = env.define("x", Value::Number(2.0), 2).unwrap_err();

        assert!(err.to_string().contains("redefine"), "{}", err);
    }

    #[test]
    fn lookup_walks_outward() {
        let globals = Environment::new().into_ref();
        globals
            .borrow_mut()
            .define("x", Value::Number(1.0), 1)
            .unwrap();

        let inner = Environment::with_enclosing(Rc::clone(&globals));

        assert_eq!(number(&inner.get("x", 1).unwrap()), 1.0);
        assert!(inner.get("y", 1).is_err());
    }

    #[test]
    fn assign_updates_the_declaring_layer() {
        let globals = Environment::new().into_ref();
        globals
            .borrow_mut()
            .define("x", Value::Number(1.0), 1)
            .unwrap();

        let inner = Environment::with_enclosing(Rc::clone(&globals)).into_ref();
        inner
            .borrow_mut()
            .assign("x", Value::Number(5.0), 2)
            .unwrap();

        assert_eq!(number(&globals.borrow().get("x", 3).unwrap()), 5.0);
        assert!(!inner.borrow().contains("x"));
    }

    #[test]
    fn get_at_and_assign_at_skip_shadowing_layers() {
        let outer = Environment::new().into_ref();
        outer
            .borrow_mut()
            .define("x", Value::Number(1.0), 1)
            .unwrap();

        let inner = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        inner
            .borrow_mut()
            .define("x", Value::Number(2.0), 1)
            .unwrap();

        assert_eq!(number(&Environment::get_at(&inner, 0, "x", 1).unwrap()), 2.0);
        assert_eq!(number(&Environment::get_at(&inner, 1, "x", 1).unwrap()), 1.0);

        Environment::assign_at(&inner, 1, "x", Value::Number(9.0), 1).unwrap();
        assert_eq!(number(&outer.borrow().get("x", 1).unwrap()), 9.0);
        assert_eq!(number(&inner.borrow().get("x", 1).unwrap()), 2.0);
    }

    #[test]
    fn get_at_past_the_root_is_an_error() {
        let root = Environment::new().into_ref();

        assert!(Environment::get_at(&root, 3, "x", 7).is_err());
    }

    #[test]
    fn collected_layer_is_a_root() {
        let env: Environment = vec![("x".to_string(), Value::Number(4.0))]
            .into_iter()
            .collect();

        assert_eq!(number(&env.get("x", 1).unwrap()), 4.0);
        assert!(env.get("y", 1).is_err());
    }

    #[test]
    fn clear_allows_redefinition() {
        let mut env = Environment::new();

        env.define("x", Value::Number(1.0), 1).unwrap();
        env.clear();
        env.define("x", Value::Number(2.0), 1).unwrap();

        assert_eq!(number(&env.get("x", 1).unwrap()), 2.0);
    }
}
