//! Named, typed slots: class fields and method parameters/returns.

use std::ops::{Deref, DerefMut};

use serde_json::{Map, Value};

use super::method::MethodRef;
use super::types::Type;
use super::wire;
use crate::error::ModelError;

/// The entity owning a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableOwner {
    /// A field of the class with this type.
    Class(Type),
    /// A parameter or return of this method.
    Method(MethodRef),
}

/// A documented, optionally typed slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Name, unique within its owner.
    pub name: String,
    /// Free-form documentation.
    pub doc: String,
    /// Declared type; `None` while the user has not picked one yet.
    pub ty: Option<Type>,
    parent: Option<VariableOwner>,
}

impl Variable {
    /// Creates a detached, undocumented variable.
    pub fn new(name: impl Into<String>, ty: Option<Type>) -> Self {
        Self { name: name.into(), doc: String::new(), ty, parent: None }
    }

    /// The owning class or method, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<&VariableOwner> {
        self.parent.as_ref()
    }

    pub(crate) fn attach(&mut self, parent: Option<VariableOwner>) {
        self.parent = parent;
    }

    /// Encodes as `{ "name", "doc", "type"? }`; `type` is omitted when unset.
    #[must_use]
    pub fn to_object(&self) -> Value {
        Value::Object(self.members())
    }

    fn members(&self) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::String(self.name.clone()));
        if let Some(ty) = &self.ty {
            obj.insert("type".into(), ty.to_object());
        }
        obj.insert("doc".into(), Value::String(self.doc.clone()));
        obj
    }

    /// Decodes the shape produced by [`Variable::to_object`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Decode`] for a malformed object or type.
    pub fn from_object(value: &Value) -> Result<Self, ModelError> {
        let obj = wire::object(value, "variable")?;
        Self::from_members(obj, "variable")
    }

    fn from_members(obj: &Map<String, Value>, entity: &'static str) -> Result<Self, ModelError> {
        let ty = match obj.get("type") {
            None | Some(Value::Null) => None,
            Some(ty) => Some(Type::from_object(ty)?),
        };
        Ok(Self {
            name: wire::required_str(obj, "name", entity)?,
            doc: wire::optional_str(obj, "doc", entity)?,
            ty,
            parent: None,
        })
    }
}

/// A class member: a variable that can be exported from its class.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    variable: Variable,
    /// Visible outside the owning class.
    pub exported: bool,
}

impl Field {
    /// Creates a detached, exported field.
    pub fn new(name: impl Into<String>, ty: Option<Type>) -> Self {
        Self { variable: Variable::new(name, ty), exported: true }
    }

    /// Encodes as a variable plus `"exported"`.
    #[must_use]
    pub fn to_object(&self) -> Value {
        let mut obj = self.variable.members();
        obj.insert("exported".into(), Value::Bool(self.exported));
        Value::Object(obj)
    }

    /// Decodes the shape produced by [`Field::to_object`]; `exported`
    /// defaults to `true`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Decode`] for a malformed object or type.
    pub fn from_object(value: &Value) -> Result<Self, ModelError> {
        let obj = wire::object(value, "field")?;
        Ok(Self {
            variable: Variable::from_members(obj, "field")?,
            exported: wire::optional_bool(obj, "exported", true, "field")?,
        })
    }
}

impl Deref for Field {
    type Target = Variable;

    fn deref(&self) -> &Variable {
        &self.variable
    }
}

impl DerefMut for Field {
    fn deref_mut(&mut self) -> &mut Variable {
        &mut self.variable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn untyped_variable_omits_type() {
        let var = Variable::new("p1", None);
        let obj = var.to_object();
        assert!(obj.get("type").is_none());
        assert_eq!(obj["name"], "p1");
        assert_eq!(Variable::from_object(&obj).unwrap(), var);
    }

    #[test]
    fn null_type_reads_as_unset() {
        let var = Variable::from_object(&json!({ "name": "x", "doc": "", "type": null })).unwrap();
        assert!(var.ty.is_none());
    }

    #[test]
    fn field_carries_exported_flag() {
        let mut field = Field::new("name", Some(Type::string()));
        field.exported = false;
        field.doc = "display name".into();

        let obj = field.to_object();
        assert_eq!(obj["exported"], false);
        assert_eq!(obj["type"]["id"], "string");

        let back = Field::from_object(&obj).unwrap();
        assert_eq!(back, field);
        assert_eq!(back.name, "name");
    }

    #[test]
    fn field_exported_defaults_to_true() {
        let field = Field::from_object(&json!({ "name": "x" })).unwrap();
        assert!(field.exported);
        assert!(field.parent().is_none());
    }
}
