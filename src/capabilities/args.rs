use mlua::{MultiValue, Value};
use std::fmt;

/// Ways a script can call a capability wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgError {
    NoneExpected,
    OneExpected,
    TwoExpected,
    FourExpected,
    OneOrTwoExpected,
    NumberExpected,
    BooleanExpected,
    StringExpected,
    NumberOrStringExpected,
    FunctionExpected,
    PositiveIntegerExpected,
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ArgError::NoneExpected => "No indata expected",
            ArgError::OneExpected => "One indata expected",
            ArgError::TwoExpected => "Two indata expected",
            ArgError::FourExpected => "Four indata expected",
            ArgError::OneOrTwoExpected => "One or two indata expected",
            ArgError::NumberExpected => "Number expected as indata",
            ArgError::BooleanExpected => "Boolean expected as indata",
            ArgError::StringExpected => "String expected as indata",
            ArgError::NumberOrStringExpected => "Number or string expected as indata",
            ArgError::FunctionExpected => "Function expected as indata",
            ArgError::PositiveIntegerExpected => "Integer greater than zero expected",
        };
        write!(f, "{}", msg)
    }
}

/// Positional arguments of one capability call, tagged with the name the script used
pub struct Args {
    name: &'static str,
    values: Vec<Value>,
}

impl Args {
    pub fn new(name: &'static str, values: MultiValue) -> Self {
        Self { name, values: values.into_vec() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build the script error for this call
    pub fn fail(&self, err: ArgError) -> mlua::Error {
        mlua::Error::RuntimeError(format!("{}: {}", self.name, err))
    }

    /// Refuse any argument
    pub fn none(&self) -> mlua::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.fail(ArgError::NoneExpected))
        }
    }

    /// Require exactly `count` arguments, `err` names the expected shape
    pub fn exactly(&self, count: usize, err: ArgError) -> mlua::Result<()> {
        if self.len() == count {
            Ok(())
        } else {
            Err(self.fail(err))
        }
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Numeric argument, integers and floats alike
    pub fn number(&self, index: usize) -> mlua::Result<f64> {
        self.number_or(index, ArgError::NumberExpected)
    }

    /// Numeric argument reporting `err` when it isn't one
    pub fn number_or(&self, index: usize, err: ArgError) -> mlua::Result<f64> {
        match self.values.get(index) {
            Some(Value::Integer(n)) => Ok(*n as f64),
            Some(Value::Number(n)) => Ok(*n),
            _ => Err(self.fail(err)),
        }
    }

    /// Numeric argument truncated towards zero
    pub fn int(&self, index: usize) -> mlua::Result<i32> {
        self.int_or(index, ArgError::NumberExpected)
    }

    pub fn int_or(&self, index: usize, err: ArgError) -> mlua::Result<i32> {
        Ok(self.number_or(index, err)? as i32)
    }

    /// Every argument as an integer, `err` on the first that isn't a number
    pub fn ints(&self, err: ArgError) -> mlua::Result<Vec<i32>> {
        (0..self.len()).map(|i| self.int_or(i, err)).collect()
    }

    pub fn boolean(&self, index: usize) -> mlua::Result<bool> {
        match self.values.get(index) {
            Some(Value::Boolean(b)) => Ok(*b),
            _ => Err(self.fail(ArgError::BooleanExpected)),
        }
    }

    /// Optional boolean, absent means `default`
    pub fn boolean_or(&self, index: usize, default: bool) -> mlua::Result<bool> {
        match self.values.get(index) {
            None => Ok(default),
            Some(_) => self.boolean(index),
        }
    }

    pub fn string(&self, index: usize) -> mlua::Result<String> {
        match self.values.get(index) {
            Some(Value::String(s)) => Ok(s.to_string_lossy().to_string()),
            _ => Err(self.fail(ArgError::StringExpected)),
        }
    }

    /// Take the argument values, used by functions that accept anything
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
