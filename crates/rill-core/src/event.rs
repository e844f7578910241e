#![forbid(unsafe_code)]

//! Named-event sources.
//!
//! [`source::from_event`](crate::source::from_event) only needs to register
//! and unregister a callback for a named event; [`EventSource`] is that
//! capability. [`EventHub`] is the in-process implementation used by the demo
//! and by tests: anything that owns a hub can [`emit`](EventHub::emit) events
//! into it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Callback invoked with each event payload.
pub type Listener<E> = Rc<dyn Fn(E)>;

/// Identifies a registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Register/unregister callbacks for named events.
pub trait EventSource<E> {
    /// Register `listener` for events called `name`.
    fn add_listener(&self, name: &str, listener: Listener<E>) -> ListenerId;

    /// Remove a listener. Returns `true` if it was registered.
    fn remove_listener(&self, name: &str, id: ListenerId) -> bool;
}

struct HubState<E> {
    next_id: u64,
    listeners: HashMap<String, Vec<(ListenerId, Listener<E>)>>,
}

/// In-process event registry keyed by event name.
///
/// Cloning creates a new handle to the **same** registry.
pub struct EventHub<E> {
    state: Rc<RefCell<HubState<E>>>,
}

impl<E> Clone for EventHub<E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventHub<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        let mut names: Vec<(&str, usize)> = state
            .listeners
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        names.sort_unstable();
        f.debug_struct("EventHub").field("listeners", &names).finish()
    }
}

impl<E> EventHub<E> {
    /// Create a hub with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HubState {
                next_id: 1,
                listeners: HashMap::new(),
            })),
        }
    }

    /// Number of listeners registered for `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.state.borrow().listeners.get(name).map_or(0, Vec::len)
    }
}

impl<E: Clone> EventHub<E> {
    /// Deliver `payload` to every listener registered for `name`.
    ///
    /// Listeners are snapshotted first, so a listener may add or remove
    /// listeners without affecting this emission. Returns the number of
    /// listeners called.
    pub fn emit(&self, name: &str, payload: E) -> usize {
        let snapshot: Vec<Listener<E>> = self
            .state
            .borrow()
            .listeners
            .get(name)
            .map(|ls| ls.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default();
        trace!(event = name, listeners = snapshot.len(), "emit");
        for listener in &snapshot {
            listener(payload.clone());
        }
        snapshot.len()
    }
}

impl<E> EventSource<E> for EventHub<E> {
    fn add_listener(&self, name: &str, listener: Listener<E>) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state
            .listeners
            .entry(name.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_listener(&self, name: &str, id: ListenerId) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            let Some(list) = state.listeners.get_mut(name) else {
                return false;
            };
            let removed = list
                .iter()
                .position(|(lid, _)| *lid == id)
                .map(|idx| list.remove(idx));
            if list.is_empty() {
                state.listeners.remove(name);
            }
            removed
        };
        removed.is_some()
    }
}
