use crate::host::{ElementId, HostResult, ListenerId, TransitionListener};

pub trait HostDocumentImpl
where
    Self: Sized + Send + Sync,
{
    type Element: HostElementImpl;

    /// Returns the first element matching `selector`, if any.
    fn query_selector(&self, selector: &str) -> Option<Self::Element>;
}

/// Handle to an element in the host document. Should be lightweight and cheap to clone.
///
/// Implementations must never invoke a transition listener synchronously from inside one of
/// these calls. Listeners are only invoked from the host's own event dispatch.
pub trait HostElementImpl
where
    Self: Clone + Send + Sync + 'static,
{
    fn id(&self) -> ElementId;

    fn set_style_property(&self, name: &str, value: &str) -> HostResult<()>;

    fn has_attribute(&self, name: &str) -> bool;
    fn set_attribute(&self, name: &str, value: &str) -> HostResult<()>;
    fn remove_attribute(&self, name: &str) -> HostResult<()>;

    fn add_class(&self, class: &str) -> HostResult<()>;
    fn remove_class(&self, class: &str) -> HostResult<()>;

    fn add_transition_listener(&self, listener: TransitionListener) -> HostResult<ListenerId>;
    fn remove_transition_listener(&self, id: ListenerId) -> HostResult<()>;
}
