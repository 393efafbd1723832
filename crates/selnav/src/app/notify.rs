//! Selection-changed subscriptions.
//!
//! Hosts keep a [`ChangeNotifier`] and hand out [`ChangeFeed`]s. Every notification is
//! a [`SelectionChange`] captured while the host is still in the state that raised it,
//! and is queued on each live feed, so a change raised while the history session is
//! busy restoring is seen afterwards, in order. Dropping a feed ends its subscription.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::app::host::ContextHost;
use crate::app::path;
use crate::domain::model::SelectionRecord;

type Queue<T> = RefCell<VecDeque<T>>;

/// One selection-changed notification.
///
/// `record` describes `selected` as the host saw it when the change fired: its path,
/// its owning context and whether a nested context was open. Later context switches
/// cannot alter it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange<E, S> {
    pub selected: Option<E>,
    pub record: Option<SelectionRecord<E, S>>,
}

impl<E: Clone, S> SelectionChange<E, S> {
    /// Capture the change to `selected` from the host's current state.
    ///
    /// A top-level entity selected while a nested context is open yields a record with
    /// `context_open` set and no source.
    pub fn capture<H>(host: &H, selected: Option<&E>) -> Self
    where
        H: ContextHost<Entity = E, Source = S>,
    {
        let record = selected.map(|entity| {
            let root = host.context_root_for(entity);
            SelectionRecord {
                target: Some(entity.clone()),
                path: path::path_of(host, Some(entity), root.as_ref()),
                context_source: host.context_of(entity),
                context_open: host.current_context().is_some(),
            }
        });

        Self {
            selected: selected.cloned(),
            record,
        }
    }
}

/// Host side of the selection-changed subscription.
pub struct ChangeNotifier<T> {
    subscribers: Vec<Weak<Queue<T>>>,
}

impl<T> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for ChangeNotifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T: Clone> ChangeNotifier<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> ChangeFeed<T> {
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        self.subscribers.push(Rc::downgrade(&queue));
        ChangeFeed { queue }
    }

    /// Deliver a notification to every live subscriber, pruning dropped ones.
    pub fn notify(&mut self, change: T) {
        self.subscribers.retain(|subscriber| match subscriber.upgrade() {
            Some(queue) => {
                queue.borrow_mut().push_back(change.clone());
                true
            }
            None => false,
        });
    }
}

impl<T> ChangeNotifier<T> {
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|subscriber| subscriber.strong_count() > 0)
            .count()
    }
}

/// Owned subscription handle. Unsubscribes when dropped.
pub struct ChangeFeed<T> {
    queue: Rc<Queue<T>>,
}

impl<T> fmt::Debug for ChangeFeed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("pending", &self.pending())
            .finish()
    }
}

impl<T> ChangeFeed<T> {
    /// Take the oldest queued notification.
    pub fn next_change(&self) -> Option<T> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Drop every queued notification, returning how many were dropped.
    pub fn discard_pending(&self) -> usize {
        let mut queue = self.queue.borrow_mut();
        let dropped = queue.len();
        queue.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_queue_in_order() {
        let mut notifier = ChangeNotifier::new();
        let feed = notifier.subscribe();

        notifier.notify(Some(1));
        notifier.notify(None);
        notifier.notify(Some(3));

        assert_eq!(feed.pending(), 3);
        assert_eq!(feed.next_change(), Some(Some(1)));
        assert_eq!(feed.next_change(), Some(None));
        assert_eq!(feed.next_change(), Some(Some(3)));
        assert_eq!(feed.next_change(), None);
    }

    #[test]
    fn dropping_feed_unsubscribes() {
        let mut notifier = ChangeNotifier::<Option<u32>>::new();
        let feed = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        drop(feed);
        assert_eq!(notifier.subscriber_count(), 0);

        notifier.notify(Some(1));
        assert!(notifier.subscribers.is_empty());
    }

    #[test]
    fn discard_pending_reports_dropped_count() {
        let mut notifier = ChangeNotifier::new();
        let feed = notifier.subscribe();
        notifier.notify("a");
        notifier.notify("b");

        assert_eq!(feed.discard_pending(), 2);
        assert_eq!(feed.pending(), 0);
    }
}
