//! Nominal types referenced by fields, parameters and returns.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::{json, Value};

use super::wire;
use crate::error::ModelError;

/// Name of the `void` built-in.
pub const VOID: &str = "void";
/// Name of the `string` built-in.
pub const STRING: &str = "string";
/// Name of the `int64` built-in.
pub const INT64: &str = "int64";
/// Name of the `float64` built-in.
pub const FLOAT64: &str = "float64";
/// Name of the `bool` built-in.
pub const BOOL: &str = "bool";
/// Generic list constructor, takes exactly one generic.
pub const LIST: &str = "List";
/// Generic map constructor, takes exactly two generics.
pub const MAP: &str = "Map";

/// Built-in type names in their canonical order.
pub const BUILT_IN: [&str; 5] = [VOID, STRING, INT64, FLOAT64, BOOL];

/// A built-in or user-defined type identified by its fully-qualified name.
///
/// User types use dotted names (`shop.model.Order`). `List` and `Map` carry
/// their element types as generics. Callers are responsible for generic
/// arity: the type itself does not check it.
///
/// Two types are equal iff their canonical strings (see [`fmt::Display`])
/// are equal.
#[derive(Debug, Clone)]
pub struct Type {
    fqn: String,
    generics: Vec<Type>,
}

impl Type {
    /// Creates a type without generics.
    pub fn new(fqn: impl Into<String>) -> Self {
        Self { fqn: fqn.into(), generics: Vec::new() }
    }

    /// Creates a type with the given generic parameters.
    pub fn with_generics(fqn: impl Into<String>, generics: Vec<Type>) -> Self {
        Self { fqn: fqn.into(), generics }
    }

    /// `void`
    #[must_use]
    pub fn void() -> Self {
        Self::new(VOID)
    }

    /// `string`
    #[must_use]
    pub fn string() -> Self {
        Self::new(STRING)
    }

    /// `int64`
    #[must_use]
    pub fn int64() -> Self {
        Self::new(INT64)
    }

    /// `float64`
    #[must_use]
    pub fn float64() -> Self {
        Self::new(FLOAT64)
    }

    /// `bool`
    #[must_use]
    pub fn bool() -> Self {
        Self::new(BOOL)
    }

    /// All built-in types in canonical order.
    #[must_use]
    pub fn built_ins() -> Vec<Type> {
        BUILT_IN.iter().map(|name| Type::new(*name)).collect()
    }

    /// `List<element>`
    #[must_use]
    pub fn list(element: Type) -> Self {
        Self::with_generics(LIST, vec![element])
    }

    /// `Map<string,value>`. Map keys are always strings.
    #[must_use]
    pub fn map(value: Type) -> Self {
        Self::with_generics(MAP, vec![Type::string(), value])
    }

    /// The fully-qualified name without generics.
    #[must_use]
    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    /// Generic parameters in declaration order.
    #[must_use]
    pub fn generics(&self) -> &[Type] {
        &self.generics
    }

    /// Returns `true` for the `void` built-in.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.fqn == VOID && self.generics.is_empty()
    }

    /// Dot-separated segments of the fully-qualified name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.fqn.split('.')
    }

    /// Parses the canonical form, e.g. `Map<string,List<shop.Order>>`.
    ///
    /// Whitespace around names is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Decode`] on an empty name, an unterminated
    /// generic list or trailing input.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let (ty, rest) = Self::parse_prefix(input.trim())?;
        if rest.trim().is_empty() {
            Ok(ty)
        } else {
            Err(ModelError::decode("type", format!("unexpected `{rest}` in `{input}`")))
        }
    }

    fn parse_prefix(input: &str) -> Result<(Self, &str), ModelError> {
        let end = input.find(&['<', ',', '>'][..]).unwrap_or(input.len());
        let name = input[..end].trim();
        if name.is_empty() {
            return Err(ModelError::decode("type", format!("missing type name in `{input}`")));
        }

        let mut ty = Type::new(name);
        let mut rest = &input[end..];
        if let Some(after) = rest.strip_prefix('<') {
            rest = after;
            loop {
                let (generic, after) = Self::parse_prefix(rest)?;
                ty.generics.push(generic);
                if let Some(after) = after.strip_prefix(',') {
                    rest = after;
                } else if let Some(after) = after.strip_prefix('>') {
                    rest = after;
                    break;
                } else {
                    return Err(ModelError::decode("type", "unterminated generic list"));
                }
            }
        }
        Ok((ty, rest))
    }

    /// Encodes as `{ "id": fqn, "generics": [...] }`.
    #[must_use]
    pub fn to_object(&self) -> Value {
        let generics: Vec<Value> = self.generics.iter().map(Type::to_object).collect();
        json!({ "id": self.fqn, "generics": generics })
    }

    /// Decodes the shape produced by [`Type::to_object`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Decode`] if `id` is missing or a member has the
    /// wrong JSON type.
    pub fn from_object(value: &Value) -> Result<Self, ModelError> {
        let obj = wire::object(value, "type")?;
        let fqn = wire::required_str(obj, "id", "type")?;
        let generics = wire::optional_array(obj, "generics", "type")?
            .iter()
            .map(Type::from_object)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fqn, generics })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqn)?;
        if self.generics.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (i, generic) in self.generics.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{generic}")?;
        }
        f.write_str(">")
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}
