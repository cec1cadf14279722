//! Hand-written method bodies per target platform.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use super::method::MethodRef;
use super::wire;
use crate::error::ModelError;

/// A target platform: a language plus the SDK it ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Go 1.x with gc, at least 1.11.
    Go1x,
    /// ES6 or a compatible runtime.
    Es6,
}

impl Platform {
    /// Every supported platform.
    pub const ALL: [Platform; 2] = [Platform::Go1x, Platform::Es6];

    /// The persisted tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Go1x => "Go 1.x",
            Platform::Es6 => "ES6",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ModelError::UnknownPlatform(s.to_string()))
    }
}

/// Source code of one method for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCode {
    /// Target platform.
    pub platform: Platform,
    /// Code lines joined with `\n`.
    pub code: String,
    parent: Option<MethodRef>,
}

impl SourceCode {
    /// Creates a detached implementation.
    pub fn new(platform: Platform, code: impl Into<String>) -> Self {
        Self { platform, code: code.into(), parent: None }
    }

    /// The owning method, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<&MethodRef> {
        self.parent.as_ref()
    }

    /// Splits the code on `\n`.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.code.split('\n').collect()
    }

    /// Replaces the code with `lines` joined by `\n`.
    pub fn set_lines<S: AsRef<str>>(&mut self, lines: &[S]) {
        self.code = lines.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n");
    }

    pub(crate) fn attach(&mut self, parent: Option<MethodRef>) {
        self.parent = parent;
    }

    /// Encodes as `{ "platform", "code" }`.
    #[must_use]
    pub fn to_object(&self) -> Value {
        json!({ "platform": self.platform.as_str(), "code": self.code })
    }

    /// Decodes the shape produced by [`SourceCode::to_object`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownPlatform`] for an unsupported platform tag
    /// and [`ModelError::Decode`] for a malformed object.
    pub fn from_object(value: &Value) -> Result<Self, ModelError> {
        let obj = wire::object(value, "source code")?;
        let platform = wire::required_str(obj, "platform", "source code")?.parse()?;
        let code = wire::optional_str(obj, "code", "source code")?;
        Ok(Self::new(platform, code))
    }
}
