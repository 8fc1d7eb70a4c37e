//! Error context utilities: attach human-readable context to any error and
//! walk/format the resulting chain.

use std::error::Error as StdError;
use std::fmt;

/// Adds contextual information to a `Result`'s error variant.
///
/// ```rust
/// use flow_tooling::error::ErrorContext;
///
/// fn parse(input: &str) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
///     input.parse::<i64>()
///         .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
///         .context(format!("failed to parse '{input}' as an integer"))
/// }
///
/// assert!(parse("not-a-number").is_err());
/// ```
pub trait ErrorContext<T> {
    /// Wrap the error with a static context message.
    fn context(self, msg: impl Into<String>) -> Result<T, Box<dyn StdError + Send + Sync>>;

    /// Wrap the error with a lazily computed context message.
    fn with_context<F>(self, f: F) -> Result<T, Box<dyn StdError + Send + Sync>>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> Result<T, Box<dyn StdError + Send + Sync>> {
        self.map_err(|e| {
            Box::new(ContextError {
                message: msg.into(),
                source: Box::new(e),
            }) as Box<dyn StdError + Send + Sync>
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, Box<dyn StdError + Send + Sync>>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            Box::new(ContextError {
                message: f(),
                source: Box::new(e),
            }) as Box<dyn StdError + Send + Sync>
        })
    }
}

#[derive(Debug)]
struct ContextError {
    message: String,
    source: Box<dyn StdError + Send + Sync>,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ContextError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source as &(dyn StdError + 'static))
    }
}

/// Render an error and its full `source()` chain, one line per cause.
pub fn format_error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        lines.push(format!("caused by: {cause}"));
        current = cause.source();
    }
    lines.join("\n")
}

/// Walk to the deepest `source()` in the chain.
pub fn root_cause(error: &(dyn StdError + 'static)) -> &(dyn StdError + 'static) {
    let mut current = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

/// Count how many links the error chain has (including `error` itself).
pub fn error_chain_length(error: &(dyn StdError + 'static)) -> usize {
    let mut len = 1;
    let mut current = error.source();
    while let Some(cause) = current {
        len += 1;
        current = cause.source();
    }
    len
}
