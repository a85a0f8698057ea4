use std::collections::BTreeMap;
use std::fmt;

use crate::complex::Complex;
use crate::error::CoreError;
use crate::function::Space;

/// A typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Double(f64),
    Complex(Complex),
    Text(String),
}

impl ArgValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Int(_) => "int",
            ArgValue::Double(_) => "double",
            ArgValue::Complex(_) => "complex",
            ArgValue::Text(_) => "text",
        }
    }

    /// Parse `text` as a value of the same type as `self`.
    fn parse_like(&self, name: &str, text: &str) -> crate::Result<Self> {
        let invalid = || CoreError::InvalidArgument {
            name: name.to_string(),
            value: text.to_string(),
            expected: self.type_name(),
        };
        let trimmed = text.trim();
        Ok(match self {
            ArgValue::Int(_) => ArgValue::Int(trimmed.parse().map_err(|_| invalid())?),
            ArgValue::Double(_) => ArgValue::Double(trimmed.parse().map_err(|_| invalid())?),
            ArgValue::Complex(_) => ArgValue::Complex(Complex::parse(trimmed).ok_or_else(invalid)?),
            ArgValue::Text(_) => ArgValue::Text(text.to_string()),
        })
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "{v}"),
            ArgValue::Double(v) => write!(f, "{v}"),
            ArgValue::Complex(v) => write!(f, "{v}"),
            ArgValue::Text(v) => f.write_str(v),
        }
    }
}

/// One named argument with a default per space.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: String,
    pub value: ArgValue,
    pub parameter_default: ArgValue,
    pub dynamical_default: ArgValue,
}

/// The argument list of an iteration function, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    items: Vec<Arg>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an argument with the same default in both spaces.
    pub fn with(self, name: &str, default: ArgValue) -> Self {
        self.with_spaces(name, default.clone(), default)
    }

    /// Declare an argument whose default depends on the space.
    ///
    /// The current value starts at the parameter-space default.
    pub fn with_spaces(mut self, name: &str, parameter: ArgValue, dynamical: ArgValue) -> Self {
        self.items.push(Arg {
            name: name.to_string(),
            value: parameter.clone(),
            parameter_default: parameter,
            dynamical_default: dynamical,
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.items.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn double(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ArgValue::Double(v) => Some(*v),
            ArgValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn complex(&self, name: &str) -> Option<Complex> {
        match self.get(name)? {
            ArgValue::Complex(v) => Some(*v),
            _ => None,
        }
    }

    /// Replace a value, keeping the declared type.
    pub fn set(&mut self, name: &str, value: ArgValue) -> crate::Result<()> {
        let arg = self.find_mut(name)?;
        if std::mem::discriminant(&arg.value) != std::mem::discriminant(&value) {
            return Err(CoreError::InvalidArgument {
                name: name.to_string(),
                value: value.to_string(),
                expected: arg.value.type_name(),
            });
        }
        arg.value = value;
        Ok(())
    }

    /// Parse `text` into the declared type of `name` and store it.
    pub fn parse(&mut self, name: &str, text: &str) -> crate::Result<()> {
        let arg = self.find_mut(name)?;
        arg.value = arg.value.parse_like(name, text)?;
        Ok(())
    }

    /// Reset every value to its default for `space`.
    pub fn reset(&mut self, space: Space) {
        for arg in &mut self.items {
            arg.value = match space {
                Space::Parameter => arg.parameter_default.clone(),
                Space::Dynamical => arg.dynamical_default.clone(),
            };
        }
    }

    /// Every argument rendered to text, keyed by name.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.items
            .iter()
            .map(|a| (a.name.clone(), a.value.to_string()))
            .collect()
    }

    fn find_mut(&mut self, name: &str) -> crate::Result<&mut Arg> {
        self.items
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| CoreError::UnknownArgument(name.to_string()))
    }
}
