//! Capability seam between the extraction logic and the browser backend.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("no element matched `{0}`")]
    NotFound(String),
    #[error("timed out after {0:?} waiting for `{1}`")]
    Timeout(Duration, String),
    #[error("element reference is stale")]
    Stale,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type DomResult<T> = Result<T, DomError>;

/// Blocking DOM access with opaque node handles.
///
/// `find`/`find_all` scope to a node when one is given, otherwise to the
/// document. Handles may go stale when the client re-renders; every method
/// taking a node reports that as [`DomError::Stale`].
pub trait Dom {
    type Node: Clone;

    fn find(&self, scope: Option<&Self::Node>, selector: &str) -> DomResult<Self::Node>;
    fn find_all(&self, scope: Option<&Self::Node>, selector: &str) -> DomResult<Vec<Self::Node>>;
    fn wait_for(&self, selector: &str, timeout: Duration) -> DomResult<Self::Node>;
    fn wait_visible(&self, node: &Self::Node, timeout: Duration) -> DomResult<()>;
    fn attribute(&self, node: &Self::Node, name: &str) -> DomResult<Option<String>>;
    fn text(&self, node: &Self::Node) -> DomResult<String>;
    fn scroll_into_view(&self, node: &Self::Node) -> DomResult<()>;
    fn is_visible(&self, node: &Self::Node) -> DomResult<bool>;
}
