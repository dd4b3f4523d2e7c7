use crate::host::{
    ElementId, HostDocumentImpl, HostElementImpl, HostError, HostResult, ListenerId,
    TransitionEvent, TransitionListener,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Every change a controller makes to a [`MockElement`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetStyle(String, String),
    SetAttribute(String, String),
    RemoveAttribute(String),
    AddClass(String),
    RemoveClass(String),
    AddListener(ListenerId),
    RemoveListener(ListenerId),
}

/// In-memory document used by tests and the demo binary.
#[derive(Clone, Default)]
pub struct MockDocument {
    elements: Arc<Mutex<Vec<MockElement>>>,
}

impl MockDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an element with the given tag and `id` attribute and appends it to the document.
    pub fn create_element(&self, tag: &str, id: Option<&str>) -> MockElement {
        let element = MockElement::new(tag);
        if let Some(id) = id {
            element.lock().attributes.insert("id".to_string(), id.to_string());
        }
        self.append(element.clone());
        element
    }

    pub fn append(&self, element: MockElement) {
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(element);
    }
}

impl HostDocumentImpl for MockDocument {
    type Element = MockElement;

    /// Supports `#id`, `.class` and bare tag selectors.
    fn query_selector(&self, selector: &str) -> Option<MockElement> {
        let elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
        elements.iter().find(|e| e.matches(selector)).cloned()
    }
}

#[derive(Default)]
struct MockElementState {
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    styles: BTreeMap<String, String>,
    listeners: Vec<(ListenerId, TransitionListener)>,
    next_listener_id: ListenerId,
    mutations: Vec<Mutation>,
    detached: bool,
}

#[derive(Clone)]
pub struct MockElement {
    id: ElementId,
    tag: String,
    state: Arc<Mutex<MockElementState>>,
}

impl MockElement {
    pub fn new(tag: &str) -> Self {
        Self {
            id: NEXT_ELEMENT_ID.fetch_add(1, Ordering::SeqCst),
            tag: tag.to_string(),
            state: Arc::new(Mutex::new(MockElementState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockElementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn matches(&self, selector: &str) -> bool {
        let state = self.lock();
        if let Some(id) = selector.strip_prefix('#') {
            state.attributes.get("id").is_some_and(|v| v == id)
        } else if let Some(class) = selector.strip_prefix('.') {
            state.classes.contains(class)
        } else {
            self.tag.eq_ignore_ascii_case(selector)
        }
    }

    fn mutate<F>(&self, mutation: Mutation, f: F) -> HostResult<()>
    where
        F: FnOnce(&mut MockElementState),
    {
        let mut state = self.lock();
        if state.detached {
            return Err(HostError::Detached(self.id));
        }
        f(&mut state);
        state.mutations.push(mutation);
        Ok(())
    }

    /// Makes every subsequent mutation fail, like a node removed from the document.
    pub fn detach(&self) {
        self.lock().detached = true;
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.lock().attributes.get(name).cloned()
    }

    pub fn style(&self, name: &str) -> Option<String> {
        self.lock().styles.get(name).cloned()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.lock().classes.contains(class)
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.lock().mutations.len()
    }

    /// Number of times the `hidden` attribute has been applied.
    pub fn hidden_applied_count(&self) -> usize {
        self.lock()
            .mutations
            .iter()
            .filter(|m| matches!(m, Mutation::SetAttribute(name, _) if name == "hidden"))
            .count()
    }

    /// Delivers a transition-end event to the listeners attached to this element.
    pub fn dispatch_transition_end(&self, event: TransitionEvent) {
        // Listeners may remove themselves, so the lock is released before invoking them.
        let listeners: Vec<TransitionListener> = self
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(&event);
        }
    }

    /// Shorthand for a transition that finished on this element itself.
    pub fn finish_transition(&self) {
        self.dispatch_transition_end(TransitionEvent::new(self.id));
    }
}

impl HostElementImpl for MockElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn set_style_property(&self, name: &str, value: &str) -> HostResult<()> {
        self.mutate(
            Mutation::SetStyle(name.to_string(), value.to_string()),
            |state| {
                state.styles.insert(name.to_string(), value.to_string());
            },
        )
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.lock().attributes.contains_key(name)
    }

    fn set_attribute(&self, name: &str, value: &str) -> HostResult<()> {
        self.mutate(
            Mutation::SetAttribute(name.to_string(), value.to_string()),
            |state| {
                state.attributes.insert(name.to_string(), value.to_string());
            },
        )
    }

    fn remove_attribute(&self, name: &str) -> HostResult<()> {
        self.mutate(Mutation::RemoveAttribute(name.to_string()), |state| {
            state.attributes.remove(name);
        })
    }

    fn add_class(&self, class: &str) -> HostResult<()> {
        self.mutate(Mutation::AddClass(class.to_string()), |state| {
            state.classes.insert(class.to_string());
        })
    }

    fn remove_class(&self, class: &str) -> HostResult<()> {
        self.mutate(Mutation::RemoveClass(class.to_string()), |state| {
            state.classes.remove(class);
        })
    }

    fn add_transition_listener(&self, listener: TransitionListener) -> HostResult<ListenerId> {
        let mut state = self.lock();
        if state.detached {
            return Err(HostError::Detached(self.id));
        }
        state.next_listener_id += 1;
        let id = state.next_listener_id;
        state.listeners.push((id, listener));
        state.mutations.push(Mutation::AddListener(id));
        Ok(id)
    }

    fn remove_transition_listener(&self, id: ListenerId) -> HostResult<()> {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(listener_id, _)| *listener_id != id);
        if state.listeners.len() == before {
            return Err(HostError::UnknownListener(id));
        }
        state.mutations.push(Mutation::RemoveListener(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_query_selector() {
        let document = MockDocument::new();
        let loading = document.create_element("div", Some("loading"));
        let main = document.create_element("main", None);
        main.add_class("content").unwrap();

        assert_eq!(document.query_selector("#loading").map(|e| e.id()), Some(loading.id()));
        assert_eq!(document.query_selector(".content").map(|e| e.id()), Some(main.id()));
        assert_eq!(document.query_selector("MAIN").map(|e| e.id()), Some(main.id()));
        assert!(document.query_selector("#missing").is_none());
    }

    #[test]
    fn test_detached_element_rejects_mutations() {
        let element = MockElement::new("div");
        element.detach();

        assert!(matches!(
            element.set_attribute("hidden", ""),
            Err(HostError::Detached(_))
        ));
        assert!(!element.has_attribute("hidden"));
        assert_eq!(element.mutation_count(), 0);
    }

    #[test]
    fn test_listener_may_remove_itself_during_dispatch() {
        let element = MockElement::new("div");
        let hits = Arc::new(AtomicUsize::new(0));
        let slot = Arc::new(Mutex::new(None::<ListenerId>));

        let (e, h, s) = (element.clone(), hits.clone(), slot.clone());
        let id = element
            .add_transition_listener(Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = s.lock().unwrap().take() {
                    e.remove_transition_listener(id).unwrap();
                }
            }))
            .unwrap();
        *slot.lock().unwrap() = Some(id);

        element.finish_transition();
        element.finish_transition();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(element.listener_count(), 0);
        assert!(matches!(
            element.remove_transition_listener(id),
            Err(HostError::UnknownListener(_))
        ));
    }
}
