use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- The HTTP layer needs to pattern match on the failure category (missing
  resource, invalid fields, unparseable body) to pick a status code
- More transparency into error handling logic
 */

/// A single field-level validation failure.
///
/// Serialized to clients as `{"field": ..., "message": ...}` by the API layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error variants that can occur in portfolio operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// A referenced resource does not exist
    NotFound { resource: &'static str, id: String },

    /// Input was well-formed but one or more fields are invalid
    Validation { errors: Vec<FieldError> },

    /// Input could not be parsed at all
    MalformedRequest { message: String },

    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound { resource, id } => write!(f, "{} {} not found", resource, id),
            ErrorKind::Validation { errors } => {
                write!(f, "Validation failed")?;
                for (i, error) in errors.iter().enumerate() {
                    let separator = if i == 0 { ": " } else { "; " };
                    write!(f, "{}{}", separator, error)?;
                }
                Ok(())
            }
            ErrorKind::MalformedRequest { message } => write!(f, "Malformed request: {}", message),
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why capture a SpanTrace in every error?
Errors are usually logged far away from where they were created. The span trace
records which instrumented operations (store calls, request handling) were active
at construction time, so the debug output shows where the error came from without
a full backtrace.
*/

/// Error type wrapping an ErrorKind with context, an optional cause and a span trace.
pub struct PortfolioError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<PortfolioError>>,
    span_trace: SpanTrace,
}

impl PortfolioError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    pub fn not_found(resource: &'static str, id: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound {
            resource,
            id: id.to_string(),
        })
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::new(ErrorKind::Validation { errors })
    }

    pub fn malformed_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedRequest {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records the error that led to this one.
    pub fn caused_by(mut self, cause: impl Into<Box<PortfolioError>>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    pub fn cause(&self) -> Option<&PortfolioError> {
        self.cause.as_deref()
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let child_count = self.context.len() + usize::from(self.cause.is_some());
        for (i, ctx) in self.context.iter().enumerate() {
            let branch = if i + 1 == child_count {
                "└─"
            } else {
                "├─"
            };
            writeln!(f, "{}{} {}", indent, branch, ctx)?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f, "{}└─ cause: {}", indent, cause.kind)?;
            cause.fmt_tree(f, &format!("{}   ", indent))?;
        }
        Ok(())
    }
}

impl From<ErrorKind> for PortfolioError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for PortfolioError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            _ => self
                .cause
                .as_deref()
                .map(|cause| cause as &(dyn StdError + 'static)),
        }
    }
}

impl fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl fmt::Debug for PortfolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        self.fmt_tree(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/* 📖 # Why use Box<PortfolioError> in the result type?

Boxing the error reduces the size of the result type, making it more efficient to return in the common case.

*/

/// Standard result type for portfolio operations.
pub type PortfolioResult<T> = std::result::Result<T, Box<PortfolioError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> PortfolioResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> PortfolioResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for PortfolioResult<T> {
    fn context(self, context: impl Into<String>) -> PortfolioResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> PortfolioResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Creates a boxed message error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::PortfolioError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed message error.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_found_display() {
        let error = PortfolioError::not_found("Project", 7);
        assert_eq!(error.to_string(), "Project 7 not found");
    }

    #[test]
    fn test_validation_display_lists_fields() {
        let error = PortfolioError::validation(vec![
            FieldError::new("title", "field required"),
            FieldError::new("technologies", "field required"),
        ]);
        assert_eq!(
            error.to_string(),
            "Validation failed: title: field required; technologies: field required"
        );
    }

    #[test]
    fn test_display_with_context() {
        let error = PortfolioError::malformed_request("expected value at line 1 column 1")
            .context("reading request body");
        assert_eq!(
            error.to_string(),
            "reading request body: Malformed request: expected value at line 1 column 1"
        );
    }

    #[test]
    fn test_kind_pattern_matching() {
        let error = PortfolioError::not_found("Project", 3);
        match error.kind() {
            ErrorKind::NotFound { resource, id } => {
                assert_eq!(*resource, "Project");
                assert_eq!(id, "3");
            }
            other => panic!("Expected NotFound variant, got {:?}", other),
        }
    }

    #[test]
    fn test_source_prefers_io_error() {
        let error = PortfolioError::new(ErrorKind::FileError {
            path: PathBuf::from("portfolio.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        });
        assert_eq!(error.root_cause().to_string(), "no such file");
    }

    #[test]
    fn test_source_follows_cause() {
        let error = PortfolioError::message("outer").caused_by(PortfolioError::message("inner"));
        assert_eq!(error.source().map(|e| e.to_string()), Some("inner".into()));
        assert_eq!(error.root_cause().to_string(), "inner");
    }

    #[test]
    fn test_result_ext_with_context_error() {
        let result: PortfolioResult<i32> = Err(Box::new(PortfolioError::message("original")));
        let err = result.with_context(|| "lazy context".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "lazy context: original");
    }

    #[test]
    fn test_result_ext_context_success() {
        let result: PortfolioResult<i32> = Ok(42);
        assert_eq!(result.context("unused").unwrap(), 42);
    }

    #[test]
    fn test_err_macro_formats_message() {
        fn failing(port: u16) -> PortfolioResult<()> {
            bail!("port {} is taken", port)
        }
        assert_eq!(failing(8000).unwrap_err().to_string(), "port 8000 is taken");
    }
}
