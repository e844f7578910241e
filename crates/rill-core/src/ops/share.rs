#![forbid(unsafe_code)]

//! Reference-counted multicasting of one upstream run.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::producer::Producer;
use crate::subject::Subject;
use crate::subscription::Subscription;

struct Connection<T> {
    generation: u64,
    hub: Option<Subject<T>>,
    upstream: Option<Subscription>,
    subscribers: usize,
}

impl<T: Clone + 'static> Producer<T> {
    /// Share one upstream run between all current subscribers.
    ///
    /// The first subscriber connects upstream through a [`Subject`]; the
    /// last one to leave disconnects it. After upstream terminates, the next
    /// subscriber starts a fresh run.
    #[must_use]
    pub fn share(&self) -> Producer<T> {
        let upstream = self.clone();
        let conn = Rc::new(RefCell::new(Connection {
            generation: 0,
            hub: None,
            upstream: None,
            subscribers: 0,
        }));
        Producer::new(move |sink| {
            let (hub, generation, first) = {
                let mut st = conn.borrow_mut();
                let hub = match st.hub.clone() {
                    Some(hub) if !hub.is_closed() => hub,
                    _ => {
                        let hub = Subject::new();
                        st.generation += 1;
                        st.hub = Some(hub.clone());
                        st.upstream = None;
                        st.subscribers = 0;
                        hub
                    }
                };
                st.subscribers += 1;
                (hub, st.generation, st.subscribers == 1)
            };

            hub.as_producer().subscribe_sink(&sink);
            if first {
                debug!(generation, "share connecting upstream");
                let run = upstream.subscribe(hub.to_consumer());
                let mut st = conn.borrow_mut();
                if st.generation == generation {
                    st.upstream = Some(run);
                }
            }

            let conn = Rc::clone(&conn);
            Subscription::from_fn(move || {
                let run = {
                    let mut st = conn.borrow_mut();
                    if st.generation != generation {
                        return;
                    }
                    st.subscribers = st.subscribers.saturating_sub(1);
                    if st.subscribers > 0 {
                        return;
                    }
                    st.hub = None;
                    st.upstream.take()
                };
                if let Some(run) = run {
                    debug!(generation, "share disconnecting upstream");
                    run.dispose();
                }
            })
        })
    }
}
