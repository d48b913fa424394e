//! Load state for observable vault collections.
//!
//! Every decrypted collection is exposed as a stream of `LoadState` values.
//! The failure-bearing variants retain the last successfully loaded value so
//! consumers can keep rendering stale-but-valid data while a refresh is in
//! flight or after it failed.

use serde::{Deserialize, Serialize};

/// The load/refresh state of an observable collection.
///
/// Invariant: transitions into `Pending`, `Error`, or `Unreachable` always
/// retain the last successfully loaded value; `Loading` is only the initial
/// state or the state immediately after the active user changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState<T> {
    /// No data has been fetched yet this session.
    Loading,
    /// The most recent successful value.
    Loaded(T),
    /// A refresh is in flight; the last-good value is retained.
    Pending(T),
    /// A refresh failed; the last-good value (if any) is retained.
    Error {
        cause: String,
        last_good: Option<T>,
    },
    /// The network is absent; the last-good value (if any) is retained.
    Unreachable { last_good: Option<T> },
}

impl<T> LoadState<T> {
    /// Returns the carried data, whether current or last-good.
    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Loading => None,
            LoadState::Loaded(data) | LoadState::Pending(data) => Some(data),
            LoadState::Error { last_good, .. } | LoadState::Unreachable { last_good } => {
                last_good.as_ref()
            }
        }
    }

    /// Takes the carried data out, leaving `Loading` behind.
    pub fn take_data(&mut self) -> Option<T> {
        match std::mem::replace(self, LoadState::Loading) {
            LoadState::Loading => None,
            LoadState::Loaded(data) | LoadState::Pending(data) => Some(data),
            LoadState::Error { last_good, .. } | LoadState::Unreachable { last_good } => last_good,
        }
    }

    /// True if no data is carried at all.
    pub fn is_empty(&self) -> bool {
        self.data().is_none()
    }

    /// Transitions into `Pending`, retaining the current data. A state with
    /// no data stays `Loading` (there is nothing to retain).
    #[must_use]
    pub fn into_pending(mut self) -> Self {
        match self.take_data() {
            Some(data) => LoadState::Pending(data),
            None => LoadState::Loading,
        }
    }

    /// Transitions into `Error`, retaining the current data as last-good.
    #[must_use]
    pub fn into_error(mut self, cause: impl Into<String>) -> Self {
        LoadState::Error {
            cause: cause.into(),
            last_good: self.take_data(),
        }
    }

    /// Transitions into `Unreachable`, retaining the current data.
    #[must_use]
    pub fn into_unreachable(mut self) -> Self {
        LoadState::Unreachable {
            last_good: self.take_data(),
        }
    }

    /// Maps the carried data, preserving the state shape.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            LoadState::Loading => LoadState::Loading,
            LoadState::Loaded(data) => LoadState::Loaded(f(data)),
            LoadState::Pending(data) => LoadState::Pending(f(data)),
            LoadState::Error { cause, last_good } => LoadState::Error {
                cause,
                last_good: last_good.map(f),
            },
            LoadState::Unreachable { last_good } => LoadState::Unreachable {
                last_good: last_good.map(f),
            },
        }
    }

    /// The error cause, if this is an `Error` state.
    pub fn error_cause(&self) -> Option<&str> {
        match self {
            LoadState::Error { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// True for the `Loading` state.
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// True for the `Pending` state.
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending(_))
    }

    /// True for the `Unreachable` state.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, LoadState::Unreachable { .. })
    }
}
