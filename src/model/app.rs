//! The root of the model tree and whole-tree queries.

use std::ops::{Deref, DerefMut};

use serde_json::Value;

use super::class::{Class, Stereotype};
use super::module::{Module, ModulePath};
use super::naming;
use super::source::Platform;
use super::types::{Type, BUILT_IN};
use super::wire;
use crate::error::ModelError;

/// An application: the root module plus queries over the whole tree.
///
/// Dereferences to its root [`Module`] for direct-child operations.
#[derive(Debug, Clone, PartialEq)]
pub struct App {
    root: Module,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Version written into the persisted root object.
    pub const SCHEMA_VERSION: u64 = 1;

    /// Creates an empty application.
    #[must_use]
    pub fn new() -> Self {
        let mut root = Module::new("");
        root.reattach(None);
        Self { root }
    }

    /// Checks whether a class named `name` is held directly by the root
    /// module. Classes in child modules are not considered; see
    /// [`App::name_exists_anywhere`].
    #[must_use]
    pub fn name_exists(&self, name: &str) -> bool {
        self.root.classes().iter().any(|c| c.name() == name)
    }

    /// Checks whether any class in the tree is named `name`.
    #[must_use]
    pub fn name_exists_anywhere(&self, name: &str) -> bool {
        self.root.collect_classes().iter().any(|c| c.name() == name)
    }

    /// Checks whether `ty` is one of the built-in types.
    #[must_use]
    pub fn is_built_in_type(&self, ty: &Type) -> bool {
        ty.generics().is_empty() && BUILT_IN.contains(&ty.fqn())
    }

    /// Every type usable in the model.
    ///
    /// Built-ins (without `void` unless `include_void`) come first, then the
    /// type of every class in traversal order. Afterwards, if requested, a
    /// `List<T>` for each non-void type collected so far, then a
    /// `Map<string,T>` for each. Wrappers are not nested.
    #[must_use]
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn get_types(&self, include_void: bool, include_lists: bool, include_maps: bool) -> Vec<Type> {
        let mut types: Vec<Type> =
            Type::built_ins().into_iter().filter(|ty| include_void || !ty.is_void()).collect();
        self.root.for_each_class(|class| types.push(class.as_type()));

        let base: Vec<Type> = types.iter().filter(|ty| !ty.is_void()).cloned().collect();
        if include_lists {
            types.extend(base.iter().cloned().map(Type::list));
        }
        if include_maps {
            types.extend(base.into_iter().map(Type::map));
        }
        types
    }

    /// Resolves a class type by walking the module names of its qualified
    /// name from the root; the last segment is the class name.
    #[must_use]
    pub fn resolve_type(&self, ty: &Type) -> Option<&Class> {
        let (path, class) = split_type(ty);
        self.root.module_at(&path)?.get_class(class)
    }

    /// Mutable variant of [`App::resolve_type`].
    pub fn resolve_type_mut(&mut self, ty: &Type) -> Option<&mut Class> {
        let (path, class) = split_type(ty);
        self.root.module_at_mut(&path)?.get_class_mut(class)
    }

    /// Removes the class denoted by `ty`; `false` if it does not resolve.
    pub fn remove_class_by_type(&mut self, ty: &Type) -> bool {
        let (path, class) = split_type(ty);
        self.root.module_at_mut(&path).is_some_and(|module| module.remove_class(class))
    }

    /// Creates an empty class named `name` in the module at `module`.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidIdentifier`] if `name` is not a class name.
    /// - [`ModelError::NameExists`] if [`App::name_exists`] reports it or
    ///   the target module already holds a class of that name.
    /// - [`ModelError::ModuleNotFound`] if `module` does not resolve.
    pub fn create_class(&mut self, module: &ModulePath, name: &str) -> Result<Type, ModelError> {
        naming::validate_class_name(name)?;
        if self.name_exists(name) {
            return Err(ModelError::NameExists(name.to_string()));
        }
        let target = self
            .root
            .module_at_mut(module)
            .ok_or_else(|| ModelError::ModuleNotFound(module.to_string()))?;
        if target.get_class(name).is_some() {
            return Err(ModelError::NameExists(name.to_string()));
        }
        Ok(target.add_class(Class::new(name)).as_type())
    }

    /// Creates the child module `name` under `parent`, or returns the path of
    /// the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIdentifier`] for an invalid name and
    /// [`ModelError::ModuleNotFound`] if `parent` does not resolve.
    pub fn create_module(&mut self, parent: &ModulePath, name: &str) -> Result<ModulePath, ModelError> {
        naming::validate_module_name(name)?;
        let target = self
            .root
            .module_at_mut(parent)
            .ok_or_else(|| ModelError::ModuleNotFound(parent.to_string()))?;
        if target.get_module(name).is_none() {
            target.add_module(Module::new(name));
        }
        Ok(parent.child(name))
    }

    /// Creates every missing module along `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIdentifier`] for an invalid segment.
    pub fn create_module_path(&mut self, path: &ModulePath) -> Result<(), ModelError> {
        let mut current = ModulePath::root();
        for segment in path.segments() {
            current = self.create_module(&current, segment)?;
        }
        Ok(())
    }

    /// Platform that code for classes with `stereotype` targets.
    #[must_use]
    pub fn platform_for_stereotype(&self, stereotype: Stereotype) -> Platform {
        stereotype.platform()
    }

    /// Encodes the root module plus `"schemaVersion"`.
    #[must_use]
    pub fn to_object(&self) -> Value {
        let mut obj = self.root.to_object();
        if let Value::Object(members) = &mut obj {
            members.insert("schemaVersion".into(), Value::from(Self::SCHEMA_VERSION));
        }
        obj
    }

    /// Decodes a tree written by [`App::to_object`] and re-attaches every
    /// parent handle. A missing `schemaVersion` reads as version 1.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Decode`] for a newer schema version or any
    /// malformed entity.
    pub fn from_object(value: &Value) -> Result<Self, ModelError> {
        let obj = wire::object(value, "app")?;
        let version = match obj.get("schemaVersion") {
            None | Some(Value::Null) => 1,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| ModelError::decode("app", "schemaVersion must be an integer"))?,
        };
        if version > Self::SCHEMA_VERSION {
            return Err(ModelError::decode(
                "app",
                format!("schema version {version} is newer than {}", Self::SCHEMA_VERSION),
            ));
        }
        Ok(Self { root: Module::from_object(value)? })
    }
}

impl Deref for App {
    type Target = Module;

    fn deref(&self) -> &Module {
        &self.root
    }
}

impl DerefMut for App {
    fn deref_mut(&mut self) -> &mut Module {
        &mut self.root
    }
}

fn split_type(ty: &Type) -> (ModulePath, &str) {
    match ty.fqn().rsplit_once('.') {
        // Empty segments stay literal so `.C` or `a..C` never reach the root.
        Some((modules, class)) => (ModulePath::from_segments(modules.split('.')), class),
        None => (ModulePath::root(), ty.fqn()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Method, Platform, SourceCode, Variable, VariableOwner};
    use serde_json::json;

    fn nested() -> App {
        let mut app = App::new();
        app.create_module_path(&ModulePath::parse("a.b")).unwrap();
        app.create_class(&ModulePath::parse("a.b"), "C").unwrap();
        app
    }

    #[test]
    fn resolves_nested_types() {
        let app = nested();
        let class = app.resolve_type(&Type::new("a.b.C")).unwrap();
        assert_eq!(class.name(), "C");
        assert_eq!(class.as_type(), Type::new("a.b.C"));

        assert!(app.resolve_type(&Type::new("a.b.Missing")).is_none());
        assert!(app.resolve_type(&Type::new("x.y.C")).is_none());
        assert!(app.resolve_type(&Type::new("b.C")).is_none());
    }

    #[test]
    fn empty_segments_do_not_resolve() {
        let mut app = nested();
        app.create_class(&ModulePath::root(), "C").unwrap();

        assert!(app.resolve_type(&Type::new("C")).is_some());
        assert!(app.resolve_type(&Type::new(".C")).is_none());
        assert!(app.resolve_type(&Type::new("a..b.C")).is_none());
        assert!(app.resolve_type_mut(&Type::new(".C")).is_none());
        assert!(!app.remove_class_by_type(&Type::new(".C")));
        assert!(app.get_class("C").is_some());
    }

    #[test]
    fn types_in_canonical_order() {
        let mut app = App::new();
        app.create_class(&ModulePath::root(), "Foo").unwrap();

        let names: Vec<String> =
            app.get_types(false, false, false).iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["string", "int64", "float64", "bool", "Foo"]);

        let with_void = app.get_types(true, false, false);
        assert_eq!(with_void[0], Type::void());

        let all: Vec<String> =
            app.get_types(true, true, true).iter().map(ToString::to_string).collect();
        assert_eq!(all.len(), 6 + 5 + 5);
        assert_eq!(all[6], "List<string>");
        assert_eq!(all[10], "List<Foo>");
        assert_eq!(all[11], "Map<string,string>");
        assert_eq!(all[15], "Map<string,Foo>");
        assert!(!all.iter().any(|t| t.contains("void>")));
    }

    #[test]
    fn built_in_membership() {
        let app = App::new();
        assert!(app.is_built_in_type(&Type::int64()));
        assert!(app.is_built_in_type(&Type::void()));
        assert!(!app.is_built_in_type(&Type::list(Type::string())));
        assert!(!app.is_built_in_type(&Type::new("Foo")));
    }

    #[test]
    fn name_exists_only_scans_root_classes() {
        let app = nested();
        assert!(!app.name_exists("C"));
        assert!(app.name_exists_anywhere("C"));
    }

    #[test]
    fn create_class_validates() {
        let mut app = nested();
        assert_eq!(
            app.create_class(&ModulePath::root(), "lower"),
            Err(ModelError::InvalidIdentifier("lower".into()))
        );
        assert_eq!(
            app.create_class(&ModulePath::parse("a.b"), "C"),
            Err(ModelError::NameExists("C".into()))
        );
        assert_eq!(
            app.create_class(&ModulePath::parse("zz"), "D"),
            Err(ModelError::ModuleNotFound("zz".into()))
        );
        app.create_class(&ModulePath::root(), "Top").unwrap();
        assert_eq!(
            app.create_class(&ModulePath::parse("a"), "Top"),
            Err(ModelError::NameExists("Top".into()))
        );
    }

    #[test]
    fn remove_by_type_is_idempotent() {
        let mut app = nested();
        assert!(app.remove_class_by_type(&Type::new("a.b.C")));
        assert!(!app.remove_class_by_type(&Type::new("a.b.C")));
        assert!(!app.remove_class_by_type(&Type::new("nowhere.C")));
    }

    #[test]
    fn round_trip_rebuilds_every_handle() {
        let mut app = nested();
        let class = app.resolve_type_mut(&Type::new("a.b.C")).unwrap();
        class.set_stereotype(Stereotype::Controller);
        class.add_field(Field::new("name", Some(Type::string())));
        let mut method = Method::new("run");
        method.add_parameter(Variable::new("p1", Some(Type::map(Type::int64()))));
        method.add_return(Variable::new("r1", Some(Type::bool())));
        method.put_implementation(SourceCode::new(Platform::Go1x, "return true"));
        class.add_method(method);

        let decoded = App::from_object(&app.to_object()).unwrap();
        assert_eq!(decoded, app);

        let class = decoded.resolve_type(&Type::new("a.b.C")).unwrap();
        assert_eq!(class.parent(), Some(&ModulePath::parse("a.b")));
        assert_eq!(
            class.fields()[0].parent(),
            Some(&VariableOwner::Class(Type::new("a.b.C")))
        );
        let method = &class.methods()[0];
        assert_eq!(method.parent(), Some(&Type::new("a.b.C")));
        assert!(method.parameters()[0].parent().is_some());
        assert!(method.returns()[0].parent().is_some());
        assert!(method.implementations()[0].parent().is_some());
        assert_eq!(decoded.get_module("a").unwrap().parent(), Some(&ModulePath::root()));
    }

    #[test]
    fn schema_version_is_checked() {
        let mut obj = App::new().to_object();
        assert_eq!(obj["schemaVersion"], 1);

        obj.as_object_mut().unwrap().remove("schemaVersion");
        assert!(App::from_object(&obj).is_ok());

        obj["schemaVersion"] = json!(99);
        assert!(matches!(App::from_object(&obj), Err(ModelError::Decode { .. })));
    }

    #[test]
    fn platform_for_stereotype_delegates() {
        let app = App::new();
        assert_eq!(app.platform_for_stereotype(Stereotype::View), Platform::Es6);
    }
}
