#![forbid(unsafe_code)]

//! A simulated button panel.
//!
//! Three buttons (`plus`, `minus`, `reset`) fire named events into an
//! [`EventHub`]. A scripted clicker presses them on a timer; the counter is a
//! pure stream over the click events, and a separate tick stream counts
//! elapsed ticks while the script runs.
//!
//! ```text
//!   interval(click_every).take(clicks) ──► hub.emit(button)
//!   from_event(plus) ─map(+1)─┐
//!   from_event(minus)─map(-1)─┼─merge─► scan ─► total
//!   from_event(reset)─────────┘
//!   interval(tick_every).tic() ─► ticks
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use rill_core::{Consumer, EventHub, Producer, SchedulerRef, Subscription, source};
use tracing::{debug, info};

pub const PLUS: &str = "plus";
pub const MINUS: &str = "minus";
pub const RESET: &str = "reset";

/// Panel simulation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelPlan {
    pub clicks: u32,
    pub click_every: Duration,
    pub tick_every: Duration,
}

impl Default for PanelPlan {
    fn default() -> Self {
        Self {
            clicks: 12,
            click_every: Duration::from_millis(40),
            tick_every: Duration::from_millis(100),
        }
    }
}

/// Which button the script presses on click number `n` (zero-based).
///
/// Every third click is `minus`, every tenth is `reset`, the rest `plus`.
#[must_use]
pub fn scripted_button(n: u64) -> &'static str {
    if n % 10 == 9 {
        RESET
    } else if n % 3 == 2 {
        MINUS
    } else {
        PLUS
    }
}

#[derive(Clone, Copy)]
enum Delta {
    Add(i64),
    Reset,
}

/// Running counter over the panel's click events.
#[must_use]
pub fn counter(buttons: &Rc<EventHub<()>>) -> Producer<i64> {
    let plus = source::from_event(buttons, PLUS).map(|()| Delta::Add(1));
    let minus = source::from_event(buttons, MINUS).map(|()| Delta::Add(-1));
    let reset = source::from_event(buttons, RESET).map(|()| Delta::Reset);
    plus.merge([minus, reset]).scan(0i64, |total, delta| match delta {
        Delta::Add(d) => total + d,
        Delta::Reset => 0,
    })
}

/// Live readings of a running panel.
#[derive(Debug, Default)]
pub struct PanelState {
    pub total: Cell<i64>,
    pub clicks: Cell<u64>,
    pub ticks: Cell<u64>,
    pub script_done: Cell<bool>,
}

/// Snapshot of [`PanelState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSummary {
    pub total: i64,
    pub clicks: u64,
    pub ticks: u64,
}

/// A wired panel; dispose to tear every stream down.
#[derive(Debug)]
pub struct PanelRun {
    pub buttons: Rc<EventHub<()>>,
    pub state: Rc<PanelState>,
    subscription: Subscription,
}

impl PanelRun {
    #[must_use]
    pub fn summary(&self) -> PanelSummary {
        PanelSummary {
            total: self.state.total.get(),
            clicks: self.state.clicks.get(),
            ticks: self.state.ticks.get(),
        }
    }

    pub fn dispose(&self) {
        self.subscription.dispose();
    }
}

/// Wire the panel streams onto `scheduler`. `on_done` runs once the click
/// script has finished.
pub fn wire(plan: &PanelPlan, scheduler: SchedulerRef, on_done: impl Fn() + 'static) -> PanelRun {
    let buttons: Rc<EventHub<()>> = Rc::new(EventHub::new());
    let state = Rc::new(PanelState::default());
    let all = Subscription::new();

    let s = Rc::clone(&state);
    all.add(counter(&buttons).subscribe_next(move |total| {
        debug!(total, "counter");
        s.total.set(total);
    }));

    let s = Rc::clone(&state);
    all.add(
        source::from_event(&buttons, PLUS)
            .merge([
                source::from_event(&buttons, MINUS),
                source::from_event(&buttons, RESET),
            ])
            .tic()
            .subscribe_next(move |n| s.clicks.set(n)),
    );

    let s = Rc::clone(&state);
    all.add(
        source::interval(plan.tick_every, Rc::clone(&scheduler))
            .tic()
            .subscribe_next(move |n| s.ticks.set(n)),
    );

    let hub = Rc::clone(&buttons);
    let s = Rc::clone(&state);
    all.add(
        source::interval(plan.click_every, scheduler)
            .take(usize::try_from(plan.clicks).unwrap_or(usize::MAX))
            .subscribe(
                Consumer::new()
                    .on_next(move |n| {
                        let button = scripted_button(n);
                        info!(click = n, button, "press");
                        hub.emit(button, ());
                    })
                    .on_complete(move || {
                        s.script_done.set(true);
                        on_done();
                    }),
            ),
    );

    PanelRun {
        buttons,
        state,
        subscription: all,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::LabScheduler;

    #[test]
    fn script_pattern() {
        let pressed: Vec<&str> = (0..10).map(scripted_button).collect();
        assert_eq!(
            pressed,
            vec![PLUS, PLUS, MINUS, PLUS, PLUS, MINUS, PLUS, PLUS, MINUS, RESET]
        );
    }

    #[test]
    fn counter_follows_buttons() {
        let buttons = Rc::new(EventHub::new());
        let last = Rc::new(Cell::new(i64::MIN));
        let l = Rc::clone(&last);
        let sub = counter(&buttons).subscribe_next(move |v| l.set(v));
        buttons.emit(PLUS, ());
        buttons.emit(PLUS, ());
        buttons.emit(MINUS, ());
        assert_eq!(last.get(), 1);
        buttons.emit(RESET, ());
        assert_eq!(last.get(), 0);
        sub.dispose();
        assert_eq!(buttons.listener_count(PLUS), 0);
    }

    #[test]
    fn scripted_run_to_completion() {
        let lab = LabScheduler::new();
        let done = Rc::new(Cell::new(0));
        let d = Rc::clone(&done);
        let plan = PanelPlan {
            clicks: 6,
            click_every: Duration::from_millis(10),
            tick_every: Duration::from_millis(25),
        };
        let run = wire(&plan, lab.handle(), move || d.set(d.get() + 1));
        lab.advance(Duration::from_millis(60));

        assert_eq!(done.get(), 1);
        assert!(run.state.script_done.get());
        assert_eq!(
            run.summary(),
            PanelSummary {
                total: 2,
                clicks: 6,
                ticks: 2
            }
        );

        run.dispose();
        assert!(lab.is_idle());
        assert_eq!(run.buttons.listener_count(PLUS), 0);
    }

    #[test]
    fn reset_click_zeroes_total() {
        let lab = LabScheduler::new();
        let plan = PanelPlan {
            clicks: 10,
            click_every: Duration::from_millis(1),
            tick_every: Duration::from_secs(1),
        };
        let run = wire(&plan, lab.handle(), || {});
        lab.advance(Duration::from_millis(10));
        assert_eq!(run.summary().total, 0);
        assert_eq!(run.summary().clicks, 10);
        run.dispose();
    }
}
