#![forbid(unsafe_code)]

//! External-event source.

use std::rc::Rc;

use crate::event::EventSource;
use crate::producer::Producer;
use crate::subscription::Subscription;

/// Emits each occurrence of the event `name` on `source`. Never completes on
/// its own.
///
/// Subscribing registers a listener; disposing removes it.
#[must_use]
pub fn from_event<E, S>(source: &Rc<S>, name: &str) -> Producer<E>
where
    E: 'static,
    S: EventSource<E> + ?Sized + 'static,
{
    let source = Rc::clone(source);
    let name: Rc<str> = Rc::from(name);
    Producer::new(move |sink| {
        let run = sink.clone();
        let id = source.add_listener(&name, Rc::new(move |event| run.next(event)));
        let source = Rc::clone(&source);
        let name = Rc::clone(&name);
        Subscription::from_fn(move || {
            source.remove_listener(&name, id);
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHub;
    use std::cell::RefCell;

    #[test]
    fn forwards_named_events() {
        let hub = Rc::new(EventHub::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let sub = from_event(&hub, "click").subscribe_next(move |pos: (i32, i32)| {
            s.borrow_mut().push(pos);
        });

        hub.emit("click", (1, 2));
        hub.emit("move", (9, 9));
        hub.emit("click", (3, 4));
        assert_eq!(*seen.borrow(), vec![(1, 2), (3, 4)]);
        sub.dispose();
    }

    #[test]
    fn dispose_removes_listener_once() {
        let hub: Rc<EventHub<()>> = Rc::new(EventHub::new());
        let sub = from_event(&hub, "tick").subscribe_next(|()| {});
        assert_eq!(hub.listener_count("tick"), 1);
        sub.dispose();
        sub.dispose();
        assert_eq!(hub.listener_count("tick"), 0);
    }

    #[test]
    fn works_through_trait_object() {
        let hub: Rc<EventHub<u8>> = Rc::new(EventHub::new());
        let dyn_source: Rc<dyn EventSource<u8>> = hub.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = from_event(&dyn_source, "key").subscribe_next(move |k| s.borrow_mut().push(k));
        hub.emit("key", 7);
        assert_eq!(*seen.borrow(), vec![7]);
    }
}
