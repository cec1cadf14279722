//! Class methods: signature plus per-platform implementations.

use serde_json::{json, Value};

use super::naming;
use super::source::{Platform, SourceCode};
use super::types::Type;
use super::variable::{Variable, VariableOwner};
use super::wire;
use crate::error::ModelError;

/// Handle to a method: the owning class's type plus the method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// Type of the owning class.
    pub class: Type,
    /// Method name.
    pub method: String,
}

/// A method owned by exactly one class.
///
/// Parameters and returns are variables owned by the method. There is at most
/// one implementation per platform; [`Method::put_implementation`] replaces
/// an existing entry for the same platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    name: String,
    parameters: Vec<Variable>,
    returns: Vec<Variable>,
    implementations: Vec<SourceCode>,
    parent: Option<Type>,
}

impl Method {
    /// Creates a detached method without parameters, returns or code.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            returns: Vec::new(),
            implementations: Vec::new(),
            parent: None,
        }
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the method and re-derives the handles of its children.
    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.attach(self.parent.clone());
    }

    /// Type of the owning class, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<&Type> {
        self.parent.as_ref()
    }

    /// Handle to this method, if attached to a class.
    #[must_use]
    pub fn handle(&self) -> Option<MethodRef> {
        self.parent
            .as_ref()
            .map(|class| MethodRef { class: class.clone(), method: self.name.clone() })
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Variable] {
        &self.parameters
    }

    /// Mutable access to a parameter by name.
    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.parameters.iter_mut().find(|p| p.name == name)
    }

    /// Return values in declaration order.
    #[must_use]
    pub fn returns(&self) -> &[Variable] {
        &self.returns
    }

    /// Mutable access to a return value by name.
    pub fn return_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.returns.iter_mut().find(|r| r.name == name)
    }

    /// Implementations in insertion order.
    #[must_use]
    pub fn implementations(&self) -> &[SourceCode] {
        &self.implementations
    }

    /// The implementation for `platform`, if any.
    #[must_use]
    pub fn implementation(&self, platform: Platform) -> Option<&SourceCode> {
        self.implementations.iter().find(|src| src.platform == platform)
    }

    /// Appends a parameter and attaches it to this method.
    pub fn add_parameter(&mut self, mut parameter: Variable) {
        parameter.attach(self.handle().map(VariableOwner::Method));
        self.parameters.push(parameter);
    }

    /// Appends a return value and attaches it to this method.
    pub fn add_return(&mut self, mut ret: Variable) {
        ret.attach(self.handle().map(VariableOwner::Method));
        self.returns.push(ret);
    }

    /// Removes the first parameter named `name`; `false` if there is none.
    pub fn remove_parameter(&mut self, name: &str) -> bool {
        remove_first(&mut self.parameters, |p| p.name == name)
    }

    /// Removes the first return value named `name`; `false` if there is none.
    pub fn remove_return(&mut self, name: &str) -> bool {
        remove_first(&mut self.returns, |r| r.name == name)
    }

    /// Stores `code`, replacing an existing implementation for the same
    /// platform in place.
    pub fn put_implementation(&mut self, mut code: SourceCode) {
        code.attach(self.handle());
        match self.implementations.iter_mut().find(|src| src.platform == code.platform) {
            Some(existing) => *existing = code,
            None => self.implementations.push(code),
        }
    }

    /// Removes the implementation for `platform`; `false` if there is none.
    pub fn remove_implementation(&mut self, platform: Platform) -> bool {
        let before = self.implementations.len();
        self.implementations.retain(|src| src.platform != platform);
        self.implementations.len() != before
    }

    /// First free parameter name of the form `p{n}`.
    #[must_use]
    pub fn generate_parameter_name(&self) -> String {
        naming::fresh_name("p", |candidate| self.parameters.iter().any(|p| p.name == candidate))
    }

    /// First free return name of the form `r{n}`.
    #[must_use]
    pub fn generate_return_name(&self) -> String {
        naming::fresh_name("r", |candidate| self.returns.iter().any(|r| r.name == candidate))
    }

    /// Sets the owning class and re-derives the handles of all children.
    ///
    /// Children of a detached method have no parent.
    pub(crate) fn attach(&mut self, parent: Option<Type>) {
        self.parent = parent;
        let handle = self.handle();
        for var in self.parameters.iter_mut().chain(self.returns.iter_mut()) {
            var.attach(handle.clone().map(VariableOwner::Method));
        }
        for src in &mut self.implementations {
            src.attach(handle.clone());
        }
    }

    /// Encodes as `{ "name", "parameters", "returns", "implementations" }`.
    #[must_use]
    pub fn to_object(&self) -> Value {
        let parameters: Vec<Value> = self.parameters.iter().map(Variable::to_object).collect();
        let returns: Vec<Value> = self.returns.iter().map(Variable::to_object).collect();
        let implementations: Vec<Value> =
            self.implementations.iter().map(SourceCode::to_object).collect();
        json!({
            "name": self.name,
            "parameters": parameters,
            "returns": returns,
            "implementations": implementations,
        })
    }

    /// Decodes the shape produced by [`Method::to_object`].
    ///
    /// A return written as a bare type object (`{ "id", "generics" }`) is
    /// read as an unnamed return of that type. Duplicate implementations for
    /// one platform collapse to the last one.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] for any malformed member.
    pub fn from_object(value: &Value) -> Result<Self, ModelError> {
        let obj = wire::object(value, "method")?;
        let mut method = Method::new(wire::required_str(obj, "name", "method")?);
        for param in wire::optional_array(obj, "parameters", "method")? {
            method.parameters.push(Variable::from_object(param)?);
        }
        for ret in wire::optional_array(obj, "returns", "method")? {
            method.returns.push(decode_return(ret)?);
        }
        for src in wire::optional_array(obj, "implementations", "method")? {
            method.put_implementation(SourceCode::from_object(src)?);
        }
        Ok(method)
    }
}

fn decode_return(value: &Value) -> Result<Variable, ModelError> {
    let is_bare_type = value.get("id").is_some() && value.get("name").is_none();
    if is_bare_type {
        Ok(Variable::new("", Some(Type::from_object(value)?)))
    } else {
        Variable::from_object(value)
    }
}

fn remove_first<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    match items.iter().position(pred) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(name: &str) -> Method {
        let mut method = Method::new(name);
        method.attach(Some(Type::new("shop.Cart")));
        method
    }

    #[test]
    fn children_follow_the_method_handle() {
        let mut method = attached("total");
        method.add_parameter(Variable::new("p1", Some(Type::int64())));
        method.put_implementation(SourceCode::new(Platform::Go1x, "return 0"));

        let expected = MethodRef { class: Type::new("shop.Cart"), method: "total".into() };
        assert_eq!(
            method.parameters()[0].parent(),
            Some(&VariableOwner::Method(expected.clone()))
        );
        assert_eq!(method.implementations()[0].parent(), Some(&expected));

        method.rename("sum");
        let renamed = MethodRef { class: Type::new("shop.Cart"), method: "sum".into() };
        assert_eq!(method.parameters()[0].parent(), Some(&VariableOwner::Method(renamed)));
    }

    #[test]
    fn detached_method_children_have_no_parent() {
        let mut method = Method::new("free");
        method.add_return(Variable::new("r1", Some(Type::bool())));
        assert!(method.returns()[0].parent().is_none());
    }

    #[test]
    fn put_implementation_keeps_one_per_platform() {
        let mut method = attached("run");
        method.put_implementation(SourceCode::new(Platform::Go1x, "v1"));
        method.put_implementation(SourceCode::new(Platform::Es6, "js"));
        method.put_implementation(SourceCode::new(Platform::Go1x, "v2"));

        assert_eq!(method.implementations().len(), 2);
        assert_eq!(method.implementations()[0].code, "v2");
        assert_eq!(method.implementation(Platform::Es6).unwrap().code, "js");
        assert!(method.remove_implementation(Platform::Es6));
        assert!(!method.remove_implementation(Platform::Es6));
    }

    #[test]
    fn generated_names_skip_taken_ones() {
        let mut method = attached("run");
        assert_eq!(method.generate_parameter_name(), "p1");
        method.add_parameter(Variable::new("p1", None));
        method.add_parameter(Variable::new("p3", None));
        assert_eq!(method.generate_parameter_name(), "p2");
        assert_eq!(method.generate_return_name(), "r1");
    }

    #[test]
    fn remove_parameter_is_safe_to_repeat() {
        let mut method = attached("run");
        method.add_parameter(Variable::new("p1", None));
        assert!(method.remove_parameter("p1"));
        assert!(!method.remove_parameter("p1"));
        assert!(method.parameters().is_empty());
    }

    #[test]
    fn decodes_bare_type_returns() {
        let value = json!({
            "name": "count",
            "parameters": [],
            "returns": [{ "id": "int64", "generics": [] }],
            "implementations": []
        });
        let method = Method::from_object(&value).unwrap();
        assert_eq!(method.returns()[0].ty, Some(Type::int64()));
        assert_eq!(method.returns()[0].name, "");
    }

    #[test]
    fn duplicate_platforms_collapse_on_decode() {
        let value = json!({
            "name": "run",
            "implementations": [
                { "platform": "ES6", "code": "a" },
                { "platform": "ES6", "code": "b" }
            ]
        });
        let method = Method::from_object(&value).unwrap();
        assert_eq!(method.implementations().len(), 1);
        assert_eq!(method.implementations()[0].code, "b");
    }
}
