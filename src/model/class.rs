//! Classes and their role stereotypes.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use super::method::Method;
use super::module::ModulePath;
use super::naming;
use super::source::Platform;
use super::types::Type;
use super::variable::{Field, VariableOwner};
use super::wire;
use crate::error::ModelError;

/// The role a class plays in the generated application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stereotype {
    /// Frontend: a reusable view such as a form.
    View,
    /// Backend: a singleton holding server-side application logic.
    Controller,
    /// Frontend: view model bound to a view, singleton per application.
    ViewController,
    /// Frontend: a navigable state composing views.
    UserInterfaceState,
    /// Frontend and backend: a persistent model exposed by a repository.
    PersistenceModel,
    /// Frontend and backend: a shared model with optional methods.
    Component,
    /// Frontend-only component.
    FrontendComponent,
    /// Backend-only component.
    BackendComponent,
}

impl Stereotype {
    /// Every stereotype in presentation order.
    pub const ALL: [Stereotype; 8] = [
        Stereotype::View,
        Stereotype::Controller,
        Stereotype::ViewController,
        Stereotype::UserInterfaceState,
        Stereotype::PersistenceModel,
        Stereotype::Component,
        Stereotype::FrontendComponent,
        Stereotype::BackendComponent,
    ];

    /// The persisted tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stereotype::View => "VIEW",
            Stereotype::Controller => "CONTROLLER",
            Stereotype::ViewController => "VIEW_CONTROLLER",
            Stereotype::UserInterfaceState => "USER_INTERFACE_STATE",
            Stereotype::PersistenceModel => "PERSISTENCE_MODEL",
            Stereotype::Component => "COMPONENT",
            Stereotype::FrontendComponent => "FRONTEND_COMPONENT",
            Stereotype::BackendComponent => "BACKEND_COMPONENT",
        }
    }

    /// Platform that hand-written code for this role targets.
    ///
    /// Shared roles go to the backend platform.
    #[must_use]
    pub fn platform(self) -> Platform {
        match self {
            Stereotype::View
            | Stereotype::ViewController
            | Stereotype::UserInterfaceState
            | Stereotype::FrontendComponent => Platform::Es6,
            Stereotype::Controller
            | Stereotype::BackendComponent
            | Stereotype::PersistenceModel
            | Stereotype::Component => Platform::Go1x,
        }
    }
}

impl fmt::Display for Stereotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stereotype {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stereotype::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ModelError::UnknownStereotype(s.to_string()))
    }
}

/// A type definition owned by one module.
///
/// A class carries at most one active stereotype. Its handle is its
/// [`Type`], derived from the owning module's path.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    name: String,
    /// Free-form documentation.
    pub doc: String,
    /// Visible outside the owning module.
    pub exported: bool,
    fields: Vec<Field>,
    methods: Vec<Method>,
    stereotype: Option<Stereotype>,
    parent: Option<ModulePath>,
}

impl Class {
    /// Creates a detached, exported class without members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            exported: true,
            fields: Vec::new(),
            methods: Vec::new(),
            stereotype: None,
            parent: None,
        }
    }

    /// Class name, unique among the classes of its module.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the class and re-derives the handles of its members. Sibling
    /// uniqueness is checked by `Module::rename_class`.
    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.attach(self.parent.clone());
    }

    /// Path of the owning module, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<&ModulePath> {
        self.parent.as_ref()
    }

    /// Returns `true` while the class is held by a module.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }

    /// This class as a type: the non-empty module names from the root down,
    /// then the class name, joined with `.`.
    #[must_use]
    pub fn as_type(&self) -> Type {
        match &self.parent {
            Some(path) => path.class_type(&self.name),
            None => Type::new(self.name.clone()),
        }
    }

    /// The active stereotype.
    #[must_use]
    pub fn stereotype(&self) -> Option<Stereotype> {
        self.stereotype
    }

    /// Returns `true` if `stereotype` is the active one.
    #[must_use]
    pub fn has_stereotype(&self, stereotype: Stereotype) -> bool {
        self.stereotype == Some(stereotype)
    }

    /// Makes `stereotype` the only active one.
    pub fn set_stereotype(&mut self, stereotype: Stereotype) {
        self.stereotype = Some(stereotype);
    }

    /// Removes the active stereotype.
    pub fn clear_stereotype(&mut self) {
        self.stereotype = None;
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// A field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Mutable access to a field by name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Appends `field`, replacing any field with the same name.
    pub fn add_field(&mut self, mut field: Field) {
        self.fields.retain(|f| f.name != field.name);
        field.attach(Some(VariableOwner::Class(self.as_type())));
        self.fields.push(field);
    }

    /// Removes the field named `name`; `false` if there is none.
    pub fn remove_field(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.name != name);
        self.fields.len() != before
    }

    /// Methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// A method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name() == name)
    }

    /// Mutable access to a method by name.
    ///
    /// Renaming goes through [`Class::rename_method`].
    pub fn method_mut(&mut self, name: &str) -> Option<&mut Method> {
        self.methods.iter_mut().find(|m| m.name() == name)
    }

    /// Appends `method`, replacing any method with the same name.
    pub fn add_method(&mut self, mut method: Method) {
        self.methods.retain(|m| m.name() != method.name());
        method.attach(Some(self.as_type()));
        self.methods.push(method);
    }

    /// Renames a method; `false` if `from` does not exist or `to` is taken.
    pub fn rename_method(&mut self, from: &str, to: &str) -> bool {
        if from != to && self.method(to).is_some() {
            return false;
        }
        match self.method_mut(from) {
            Some(method) => {
                method.rename(to);
                true
            }
            None => false,
        }
    }

    /// Removes the method named `name`; `false` if there is none.
    pub fn remove_method(&mut self, name: &str) -> bool {
        let before = self.methods.len();
        self.methods.retain(|m| m.name() != name);
        self.methods.len() != before
    }

    /// First free field name of the form `field{n}`.
    #[must_use]
    pub fn generate_field_name(&self) -> String {
        naming::fresh_name("field", |candidate| self.field(candidate).is_some())
    }

    /// First free method name of the form `method{n}`.
    #[must_use]
    pub fn generate_method_name(&self) -> String {
        naming::fresh_name("method", |candidate| self.method(candidate).is_some())
    }

    /// Sets the owning module and re-derives member handles.
    pub(crate) fn attach(&mut self, parent: Option<ModulePath>) {
        self.parent = parent;
        let ty = self.as_type();
        for field in &mut self.fields {
            field.attach(Some(VariableOwner::Class(ty.clone())));
        }
        for method in &mut self.methods {
            method.attach(Some(ty.clone()));
        }
    }

    /// Encodes as `{ "name", "doc", "exported", "fields", "methods",
    /// "stereotypes" }`.
    #[must_use]
    pub fn to_object(&self) -> Value {
        let fields: Vec<Value> = self.fields.iter().map(Field::to_object).collect();
        let methods: Vec<Value> = self.methods.iter().map(Method::to_object).collect();
        let stereotypes: Vec<&str> = self.stereotype.iter().map(|st| st.as_str()).collect();
        json!({
            "name": self.name,
            "doc": self.doc,
            "exported": self.exported,
            "fields": fields,
            "methods": methods,
            "stereotypes": stereotypes,
        })
    }

    /// Decodes the shape produced by [`Class::to_object`].
    ///
    /// The result is detached; members are attached to the class itself.
    /// When several stereotypes are stored the last one wins.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] for any malformed member or unknown stereotype.
    pub fn from_object(value: &Value) -> Result<Self, ModelError> {
        let obj = wire::object(value, "class")?;
        let mut class = Class::new(wire::required_str(obj, "name", "class")?);
        class.doc = wire::optional_str(obj, "doc", "class")?;
        class.exported = wire::optional_bool(obj, "exported", true, "class")?;
        for field in wire::optional_array(obj, "fields", "class")? {
            class.fields.push(Field::from_object(field)?);
        }
        for method in wire::optional_array(obj, "methods", "class")? {
            class.methods.push(Method::from_object(method)?);
        }
        for tag in wire::optional_array(obj, "stereotypes", "class")? {
            let tag = tag
                .as_str()
                .ok_or_else(|| ModelError::decode("class", "stereotypes must be strings"))?;
            class.stereotype = Some(tag.parse()?);
        }
        class.attach(None);
        Ok(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variable;

    #[test]
    fn single_active_stereotype() {
        let mut class = Class::new("Order");
        assert!(class.stereotype().is_none());

        class.set_stereotype(Stereotype::View);
        class.set_stereotype(Stereotype::PersistenceModel);
        assert!(class.has_stereotype(Stereotype::PersistenceModel));
        assert!(!class.has_stereotype(Stereotype::View));
        assert_eq!(class.to_object()["stereotypes"], json!(["PERSISTENCE_MODEL"]));

        class.clear_stereotype();
        assert_eq!(class.to_object()["stereotypes"], json!([]));
    }

    #[test]
    fn stereotype_platforms() {
        assert_eq!(Stereotype::View.platform(), Platform::Es6);
        assert_eq!(Stereotype::Controller.platform(), Platform::Go1x);
        assert_eq!(Stereotype::PersistenceModel.platform(), Platform::Go1x);
        assert_eq!("BACKEND_COMPONENT".parse::<Stereotype>().unwrap(), Stereotype::BackendComponent);
        assert!("MODEL".parse::<Stereotype>().is_err());
    }

    #[test]
    fn detached_class_type_is_its_name() {
        let class = Class::new("Order");
        assert_eq!(class.as_type(), Type::new("Order"));
        assert!(!class.is_attached());
    }

    #[test]
    fn members_point_back_to_the_class() {
        let mut class = Class::new("Order");
        class.attach(Some(ModulePath::from_segments(["shop"])));
        class.add_field(Field::new("total", Some(Type::float64())));
        let mut method = Method::new("pay");
        method.add_parameter(Variable::new("amount", Some(Type::float64())));
        class.add_method(method);

        assert_eq!(
            class.fields()[0].parent(),
            Some(&VariableOwner::Class(Type::new("shop.Order")))
        );
        assert_eq!(class.methods()[0].parent(), Some(&Type::new("shop.Order")));
        assert!(class.methods()[0].parameters()[0].parent().is_some());

        class.rename("Purchase");
        assert_eq!(
            class.fields()[0].parent(),
            Some(&VariableOwner::Class(Type::new("shop.Purchase")))
        );
    }

    #[test]
    fn add_field_replaces_same_name() {
        let mut class = Class::new("Order");
        class.add_field(Field::new("id", Some(Type::string())));
        class.add_field(Field::new("total", None));
        class.add_field(Field::new("id", Some(Type::int64())));

        assert_eq!(class.fields().len(), 2);
        assert_eq!(class.field("id").unwrap().ty, Some(Type::int64()));
        assert!(class.remove_field("id"));
        assert!(!class.remove_field("id"));
    }

    #[test]
    fn generated_member_names() {
        let mut class = Class::new("Order");
        assert_eq!(class.generate_field_name(), "field1");
        class.add_field(Field::new(class.generate_field_name(), None));
        assert_eq!(class.generate_field_name(), "field2");

        class.add_method(Method::new(class.generate_method_name()));
        assert_eq!(class.methods()[0].name(), "method1");
        assert!(class.rename_method("method1", "checkout"));
        assert!(!class.rename_method("missing", "other"));
        class.add_method(Method::new("cancel"));
        assert!(!class.rename_method("cancel", "checkout"));
    }

    #[test]
    fn decode_takes_last_stereotype_and_defaults() {
        let value = json!({
            "name": "Legacy",
            "stereotypes": ["VIEW", "CONTROLLER"]
        });
        let class = Class::from_object(&value).unwrap();
        assert_eq!(class.stereotype(), Some(Stereotype::Controller));
        assert!(class.exported);
        assert_eq!(class.doc, "");

        let bad = json!({ "name": "X", "stereotypes": ["NOPE"] });
        assert_eq!(
            Class::from_object(&bad).unwrap_err(),
            ModelError::UnknownStereotype("NOPE".into())
        );
    }
}
