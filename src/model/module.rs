//! Modules: named containers of child modules and classes.

use std::fmt;

use serde_json::{json, Value};

use super::class::Class;
use super::types::Type;
use super::wire;
use crate::error::ModelError;

/// Names of the modules leading from the root module to a module.
///
/// The empty path denotes the root module itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// The root module.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Builds a path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parses a dotted path; the empty string is the root.
    #[must_use]
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            Self::root()
        } else {
            Self::from_segments(dotted.split('.'))
        }
    }

    /// Segments from the root down.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path of a child module named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// The type of a class named `name` held by this module. Empty segments
    /// are skipped.
    #[must_use]
    pub fn class_type(&self, name: &str) -> Type {
        let mut fqn = String::new();
        for segment in self.0.iter().filter(|s| !s.is_empty()) {
            fqn.push_str(segment);
            fqn.push('.');
        }
        fqn.push_str(name);
        Type::new(fqn)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A module holds exported child modules and classes.
///
/// Module names are unique among sibling modules and class names among
/// sibling classes. Every held module and class carries this module's path
/// as its parent handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    name: String,
    /// Free-form documentation.
    pub doc: String,
    modules: Vec<Module>,
    classes: Vec<Class>,
    parent: Option<ModulePath>,
}

impl Module {
    /// Creates a detached, empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the module and re-derives the handles of its whole subtree.
    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.reattach(self.parent.clone());
    }

    /// Path of the owning module, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<&ModulePath> {
        self.parent.as_ref()
    }

    /// Path of this module. A module without a parent is treated as a root.
    #[must_use]
    pub fn path(&self) -> ModulePath {
        match &self.parent {
            Some(parent) => parent.child(&self.name),
            None => ModulePath::root(),
        }
    }

    /// Direct child modules.
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Direct child classes.
    #[must_use]
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// A direct child module by name.
    #[must_use]
    pub fn get_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Mutable access to a direct child module by name.
    pub fn get_module_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.name == name)
    }

    /// A direct child class by name.
    #[must_use]
    pub fn get_class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name() == name)
    }

    /// Mutable access to a direct child class by name.
    pub fn get_class_mut(&mut self, name: &str) -> Option<&mut Class> {
        self.classes.iter_mut().find(|c| c.name() == name)
    }

    /// Walks `path` down from this module.
    #[must_use]
    pub fn module_at(&self, path: &ModulePath) -> Option<&Module> {
        path.segments().iter().try_fold(self, |module, name| module.get_module(name))
    }

    /// Mutable variant of [`Module::module_at`].
    pub fn module_at_mut(&mut self, path: &ModulePath) -> Option<&mut Module> {
        path.segments().iter().try_fold(self, |module, name| module.get_module_mut(name))
    }

    /// Adds `class`, dropping any class with the same name first, and makes
    /// this module its parent.
    pub fn add_class(&mut self, mut class: Class) -> &mut Class {
        self.classes.retain(|c| c.name() != class.name());
        class.attach(Some(self.path()));
        self.classes.push(class);
        let last = self.classes.len() - 1;
        &mut self.classes[last]
    }

    /// Adds `module`, dropping any module with the same name first, and
    /// re-derives the handles of its subtree.
    pub fn add_module(&mut self, mut module: Module) -> &mut Module {
        self.modules.retain(|m| m.name != module.name);
        module.reattach(Some(self.path()));
        self.modules.push(module);
        let last = self.modules.len() - 1;
        &mut self.modules[last]
    }

    /// Renames the class `from` to `to`; `false` if `from` is not held here
    /// or another class is already named `to`.
    pub fn rename_class(&mut self, from: &str, to: &str) -> bool {
        if from != to && self.get_class(to).is_some() {
            return false;
        }
        match self.get_class_mut(from) {
            Some(class) => {
                class.rename(to);
                true
            }
            None => false,
        }
    }

    /// Renames the child module `from` to `to`; `false` if `from` is not
    /// held here or another child module is already named `to`.
    pub fn rename_module(&mut self, from: &str, to: &str) -> bool {
        if from != to && self.get_module(to).is_some() {
            return false;
        }
        match self.get_module_mut(from) {
            Some(module) => {
                module.rename(to);
                true
            }
            None => false,
        }
    }

    /// Detaches and returns the class named `name`.
    pub fn take_class(&mut self, name: &str) -> Option<Class> {
        let index = self.classes.iter().position(|c| c.name() == name)?;
        let mut class = self.classes.remove(index);
        class.attach(None);
        Some(class)
    }

    /// Removes the class named `name`; `false` if it is not held here.
    pub fn remove_class(&mut self, name: &str) -> bool {
        self.take_class(name).is_some()
    }

    /// Removes the child module named `name` with its subtree; `false` if it
    /// is not held here.
    pub fn remove_module(&mut self, name: &str) -> bool {
        let before = self.modules.len();
        self.modules.retain(|m| m.name != name);
        self.modules.len() != before
    }

    /// Visits every class of this module, then recurses into child modules.
    ///
    /// The visitor must not restructure the tree.
    pub fn for_each_class(&self, mut visitor: impl FnMut(&Class)) {
        self.visit_classes(&mut visitor);
    }

    fn visit_classes(&self, visitor: &mut dyn FnMut(&Class)) {
        for class in &self.classes {
            visitor(class);
        }
        for module in &self.modules {
            module.visit_classes(visitor);
        }
    }

    /// Every class of this subtree in [`Module::for_each_class`] order.
    #[must_use]
    pub fn collect_classes(&self) -> Vec<&Class> {
        let mut classes = Vec::new();
        self.collect_into(&mut classes);
        classes
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a Class>) {
        out.extend(self.classes.iter());
        for module in &self.modules {
            module.collect_into(out);
        }
    }

    /// Sets the parent handle and re-derives handles for the whole subtree.
    pub(crate) fn reattach(&mut self, parent: Option<ModulePath>) {
        self.parent = parent;
        let path = self.path();
        for class in &mut self.classes {
            class.attach(Some(path.clone()));
        }
        for module in &mut self.modules {
            module.reattach(Some(path.clone()));
        }
    }

    /// Encodes as `{ "name", "doc", "modules", "classes" }`.
    #[must_use]
    pub fn to_object(&self) -> Value {
        let modules: Vec<Value> = self.modules.iter().map(Module::to_object).collect();
        let classes: Vec<Value> = self.classes.iter().map(Class::to_object).collect();
        json!({
            "name": self.name,
            "doc": self.doc,
            "modules": modules,
            "classes": classes,
        })
    }

    /// Decodes the shape produced by [`Module::to_object`].
    ///
    /// The result is treated as a root: its own parent is unset and all
    /// handles below it are derived from it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] for any malformed member.
    pub fn from_object(value: &Value) -> Result<Self, ModelError> {
        let mut module = Self::decode(value)?;
        module.reattach(None);
        Ok(module)
    }

    fn decode(value: &Value) -> Result<Self, ModelError> {
        let obj = wire::object(value, "module")?;
        let mut module = Module::new(wire::required_str(obj, "name", "module")?);
        module.doc = wire::optional_str(obj, "doc", "module")?;
        for child in wire::optional_array(obj, "modules", "module")? {
            module.modules.push(Self::decode(child)?);
        }
        for class in wire::optional_array(obj, "classes", "module")? {
            module.classes.push(Class::from_object(class)?);
        }
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Module {
        let mut root = Module::new("");
        root.reattach(None);
        root.add_class(Class::new("Top"));
        let shop = root.add_module(Module::new("shop"));
        shop.add_class(Class::new("Order"));
        let model = shop.add_module(Module::new("model"));
        model.add_class(Class::new("Line"));
        root.add_module(Module::new("auth")).add_class(Class::new("User"));
        root
    }

    #[test]
    fn lookups_are_direct_children_only() {
        let root = sample();
        assert!(root.get_module("shop").is_some());
        assert!(root.get_module("model").is_none());
        assert!(root.get_class("Top").is_some());
        assert!(root.get_class("Order").is_none());
    }

    #[test]
    fn depth_first_class_order() {
        let root = sample();
        let names: Vec<&str> = root.collect_classes().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Top", "Order", "Line", "User"]);

        let mut visited = Vec::new();
        root.for_each_class(|c| visited.push(c.as_type().to_string()));
        assert_eq!(visited, vec!["Top", "shop.Order", "shop.model.Line", "auth.User"]);
    }

    #[test]
    fn add_class_replaces_same_name() {
        let mut root = sample();
        let before = root.classes().len();
        let mut replacement = Class::new("Top");
        replacement.doc = "second".into();
        root.add_class(replacement);

        assert_eq!(root.classes().len(), before);
        assert_eq!(root.get_class("Top").unwrap().doc, "second");
        assert_eq!(root.get_class("Top").unwrap().parent(), Some(&ModulePath::root()));
    }

    #[test]
    fn take_class_detaches() {
        let mut root = sample();
        let shop = root.get_module_mut("shop").unwrap();
        let order = shop.take_class("Order").unwrap();
        assert!(order.parent().is_none());
        assert!(!shop.remove_class("Order"));
    }

    #[test]
    fn rename_rederives_subtree_handles() {
        let mut root = sample();
        assert!(root.rename_module("shop", "store"));
        let line = root
            .module_at(&ModulePath::parse("store.model"))
            .and_then(|m| m.get_class("Line"))
            .unwrap();
        assert_eq!(line.as_type(), Type::new("store.model.Line"));
    }

    #[test]
    fn rename_class_refuses_taken_name() {
        let mut root = sample();
        root.add_class(Class::new("Other"));

        assert!(!root.rename_class("Top", "Other"));
        assert_eq!(root.classes().iter().filter(|c| c.name() == "Other").count(), 1);
        assert!(root.get_class("Top").is_some());

        assert!(root.rename_class("Top", "Head"));
        assert!(root.get_class("Top").is_none());
        assert_eq!(root.get_class("Head").unwrap().as_type(), Type::new("Head"));
        assert!(!root.rename_class("Missing", "Anything"));
        assert!(root.rename_class("Head", "Head"));
    }

    #[test]
    fn rename_module_refuses_taken_name() {
        let mut root = sample();

        assert!(!root.rename_module("shop", "auth"));
        assert_eq!(root.modules().iter().filter(|m| m.name() == "auth").count(), 1);
        assert!(root.get_module("shop").is_some());
        assert!(!root.rename_module("missing", "other"));
    }

    #[test]
    fn module_paths() {
        assert!(ModulePath::parse("").is_root());
        let path = ModulePath::parse("a.b");
        assert_eq!(path.segments(), ["a", "b"]);
        assert_eq!(path.to_string(), "a.b");
        assert_eq!(path.child("c").class_type("D"), Type::new("a.b.c.D"));
        assert_eq!(ModulePath::root().class_type("D"), Type::new("D"));
    }

    #[test]
    fn decode_attaches_every_class() {
        let root = sample();
        let decoded = Module::from_object(&root.to_object()).unwrap();
        assert_eq!(decoded, root);
        decoded.for_each_class(|c| assert!(c.is_attached(), "{} detached", c.name()));
    }

    #[test]
    fn remove_module_drops_subtree() {
        let mut root = sample();
        assert!(root.remove_module("shop"));
        assert!(!root.remove_module("shop"));
        assert_eq!(root.collect_classes().len(), 2);
    }
}
