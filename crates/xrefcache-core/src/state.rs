//! Load lifecycle of a cached resource.

use crate::error::FetchError;

/// Load state of a single cached resource.
///
/// `Unrequested` and `Pending` are distinct: a resource nobody asked for
/// yet is never confused with one whose fetch is outstanding.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    /// Never requested
    Unrequested,
    /// Fetch dispatched, response outstanding
    Pending,
    /// Value available
    Ready(T),
    /// Last fetch failed; eligible for retry
    Failed(FetchError),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self::Unrequested
    }
}

impl<T> LoadState<T> {
    pub fn is_unrequested(&self) -> bool {
        matches!(self, Self::Unrequested)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether a consumer should dispatch a fetch for this resource.
    pub fn should_load(&self) -> bool {
        matches!(self, Self::Unrequested | Self::Failed(_))
    }

    /// Borrow the loaded value.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Take the loaded value.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the failure cause.
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Short lowercase name of the state, used in logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unrequested => "unrequested",
            Self::Pending => "pending",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            Self::Unrequested => LoadState::Unrequested,
            Self::Pending => LoadState::Pending,
            Self::Ready(value) => LoadState::Ready(f(value)),
            Self::Failed(err) => LoadState::Failed(err),
        }
    }
}
