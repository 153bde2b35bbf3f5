/// Boxed error type returned by user tag callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while rendering a tree.
///
/// Parsing itself never fails; recovery outcomes are reported through
/// `Parser::error` instead.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// A user-supplied tag callback failed. The callback's error is
    /// propagated unchanged.
    #[error("callback for tag [{tag}] failed: {source}")]
    Callback {
        tag: String,
        #[source]
        source: CallbackError,
    },
}
