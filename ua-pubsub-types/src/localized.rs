use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Human-readable text with an optional locale tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub locale: Option<Arc<str>>,
    pub text: Arc<str>,
}

impl LocalizedText {
    pub fn new(locale: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        Self {
            locale: Some(locale.into()),
            text: text.into(),
        }
    }

    /// Text without a locale, the common case for engine-generated labels.
    pub fn from_text(text: impl Into<Arc<str>>) -> Self {
        Self {
            locale: None,
            text: text.into(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Display for LocalizedText {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for LocalizedText {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

/// A namespace-qualified browse name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespace_index: u16,
    pub name: Arc<str>,
}

impl QualifiedName {
    pub fn new(namespace_index: u16, name: impl Into<Arc<str>>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}
