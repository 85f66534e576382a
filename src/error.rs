use std::{collections::BTreeMap, fmt, io, sync::Arc};

use crate::atlas::AtlasError;

#[derive(Debug, Clone)]
pub struct ViewerError {
    pub key: &'static str,
    pub args: BTreeMap<&'static str, String>,
    pub causes: Vec<ViewerCause>,
}

#[derive(Debug, Clone)]
pub enum ViewerCause {
    Viewer(Box<ViewerError>),
    Std(Arc<dyn std::error::Error + Send + Sync>),
}

impl ViewerError {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            args: BTreeMap::new(),
            causes: Vec::new(),
        }
    }

    pub fn with_arg(mut self, k: &'static str, v: impl ToString) -> Self {
        self.args.insert(k, v.to_string());
        self
    }

    pub fn push_viewer(mut self, cause: ViewerError) -> Self {
        self.causes.push(ViewerCause::Viewer(Box::new(cause)));
        self
    }

    pub fn push_std(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.causes.push(ViewerCause::Std(Arc::new(cause)));
        self
    }

    pub fn arg(&self, k: &str) -> Option<&str> {
        self.args.get(k).map(String::as_str)
    }

    /// Key, args and the first cause, for the status line.
    pub fn message(&self) -> String {
        match self.causes.first() {
            Some(ViewerCause::Viewer(e)) => format!("{self}: {}", e.message()),
            Some(ViewerCause::Std(e)) => format!("{self}: {e}"),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.key)?;
        let mut first = true;
        for (k, v) in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        write!(f, ")")
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.causes.iter().find_map(|c| match c {
            ViewerCause::Viewer(e) => Some(e.as_ref() as &dyn std::error::Error),
            ViewerCause::Std(e) => Some(e.as_ref() as &(dyn std::error::Error + 'static)),
        })
    }
}

impl From<io::Error> for ViewerError {
    fn from(err: io::Error) -> Self {
        ViewerError::new("io-error").push_std(err)
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::new("skeleton-parse-failed")
            .with_arg("line", err.line())
            .with_arg("column", err.column())
            .push_std(err)
    }
}

impl From<image::ImageError> for ViewerError {
    fn from(err: image::ImageError) -> Self {
        ViewerError::new("image-error").push_std(err)
    }
}

impl From<AtlasError> for ViewerError {
    fn from(err: AtlasError) -> Self {
        ViewerError::new("atlas-parse-failed").push_std(err)
    }
}

impl From<winit::error::EventLoopError> for ViewerError {
    fn from(err: winit::error::EventLoopError) -> Self {
        ViewerError::new("event-loop-failed").push_std(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_args_in_key_order() {
        let err = ViewerError::new("required-files-not-found")
            .with_arg("skeleton", "missing")
            .with_arg("atlas", "atlas.atlas");
        assert_eq!(
            err.to_string(),
            "required-files-not-found(atlas=atlas.atlas, skeleton=missing)"
        );
    }

    #[test]
    fn source_walks_nested_cause() {
        let inner = ViewerError::new("read-failed").with_arg("file", "a.json");
        let outer = ViewerError::new("assembly-failed").push_viewer(inner);
        let source = std::error::Error::source(&outer).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("read-failed(file=a.json)"));
        assert!(outer.message().starts_with("assembly-failed(): read-failed"));
    }

    #[test]
    fn json_errors_carry_position() {
        let err: ViewerError = serde_json::from_str::<serde_json::Value>("{ nope")
            .unwrap_err()
            .into();
        assert_eq!(err.key, "skeleton-parse-failed");
        assert_eq!(err.arg("line"), Some("1"));
    }
}
