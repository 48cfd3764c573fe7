use std::fmt;

/// Handle returned by [`Subject::attach`], used to detach the callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A synchronous notification channel.
///
/// Callbacks run on the notifying thread, in the order they were attached, before
/// the mutating call returns. Callbacks must not re-enter the entity that owns the
/// subject.
pub struct Subject<E> {
    next_id: u64,
    slots: Vec<(SubscriptionId, Box<dyn FnMut(&E)>)>,
}

impl<E> Subject<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            slots: Vec::new(),
        }
    }

    pub fn attach(&mut self, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.slots.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if the subscription was not attached to this subject.
    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot_id, _)| *slot_id != id);
        self.slots.len() != before
    }

    pub fn notify(&mut self, event: &E) {
        for (_, callback) in self.slots.iter_mut() {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<E> Default for Subject<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Subject<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.slots.len())
            .finish()
    }
}
