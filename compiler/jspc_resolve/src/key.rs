//! Fully-qualified binary class names.

use std::fmt;
use std::sync::Arc;

/// A fully-qualified binary class name such as `java.util.Map$Entry`.
///
/// Cheap to clone: the name is shared behind an `Arc`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolutionKey(Arc<str>);

impl ResolutionKey {
    pub fn new(name: impl AsRef<str>) -> Self {
        ResolutionKey(Arc::from(name.as_ref()))
    }

    /// Join compound name segments (`["java", "util", "Map"]`) with dots.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let mut name = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                name.push('.');
            }
            name.push_str(segment.as_ref());
        }
        ResolutionKey(Arc::from(name))
    }

    /// Qualify `type_name` with a package given as segments.
    pub fn qualified<S: AsRef<str>>(package: &[S], type_name: &str) -> Self {
        let mut name = String::new();
        for segment in package {
            name.push_str(segment.as_ref());
            name.push('.');
        }
        name.push_str(type_name);
        ResolutionKey(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classpath-relative resource path: `java/util/Map$Entry.class`.
    pub fn resource_path(&self) -> String {
        let mut path = self.0.replace('.', "/");
        path.push_str(".class");
        path
    }

    /// Last dotted segment.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Dotted package prefix, empty for the default package.
    pub fn package(&self) -> &str {
        self.0.rfind('.').map_or("", |dot| &self.0[..dot])
    }
}

impl fmt::Debug for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolutionKey({})", self.0)
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResolutionKey {
    fn from(name: &str) -> Self {
        ResolutionKey::new(name)
    }
}
