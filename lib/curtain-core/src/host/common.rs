use std::sync::Arc;
use thiserror::Error;

pub type ElementId = u64;
pub type ListenerId = u64;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("element {0} is detached from the document")]
    Detached(ElementId),
    #[error("listener {0} is not registered")]
    UnknownListener(ListenerId),
}

pub type HostResult<T> = Result<T, HostError>;

/// Sent by the styling layer when a CSS transition on some element finishes. Transition events
/// bubble, so `target` may be a descendant of the element the listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub target: ElementId,
}

impl TransitionEvent {
    pub fn new(target: ElementId) -> Self {
        Self { target }
    }
}

pub type TransitionListener = Arc<dyn Fn(&TransitionEvent) + Send + Sync>;
