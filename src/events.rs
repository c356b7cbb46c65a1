//! Typed callback registries.
//!
//! An [`Events<C, A>`] keeps listeners that receive a mutable context `C` and an
//! argument `A`. Listeners run synchronously in registration order. Ids are the
//! smallest positive integer not currently bound, so an id freed by
//! [`unbind`](Events::unbind) is handed out again before any higher one.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

type Callback<C, A> = Box<dyn FnMut(&mut C, &A)>;

pub struct Events<C, A> {
    listeners: Vec<(ListenerId, Callback<C, A>)>,
}

impl<C, A> Default for Events<C, A> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<C, A> fmt::Debug for Events<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|(id, _)| id))
            .finish()
    }
}

impl<C, A> Events<C, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, callback: impl FnMut(&mut C, &A) + 'static) -> ListenerId {
        let id = self.next_free_id();
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// Removes the listener bound under `id`. Returns whether one was removed.
    pub fn unbind(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|(bound, _)| *bound == id) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn run(&mut self, ctx: &mut C, args: &A) {
        for (_, callback) in self.listeners.iter_mut() {
            callback(ctx, args);
        }
    }

    pub fn is_bound(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|(bound, _)| *bound == id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    fn next_free_id(&self) -> ListenerId {
        let mut taken: Vec<u32> = self.listeners.iter().map(|(id, _)| id.0).collect();
        taken.sort_unstable();
        let mut candidate = 1;
        for id in taken {
            if id == candidate {
                candidate += 1;
            } else if id > candidate {
                break;
            }
        }
        ListenerId(candidate)
    }
}
