//! Ordered multi-subscriber callback lists.
//!
//! A [`Delegate`] holds any number of subscribers sharing one callable
//! contract `T` (usually a trait object such as `dyn Handler`). Calling the
//! delegate invokes every subscriber in subscription order and collects one
//! result per subscriber. An empty result list means "nothing happened",
//! which the engine uses to tell a non-matching command apart from one that
//! matched and ran.

use std::fmt;
use std::rc::Rc;

/// Ordered list of subscribers of one callable contract.
pub struct Delegate<T: ?Sized> {
    subscribers: Vec<Rc<T>>,
}

impl<T: ?Sized> Delegate<T> {
    /// Create a delegate with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Append `subscriber`; it will be invoked after every existing one.
    pub fn connect(&mut self, subscriber: Rc<T>) {
        self.subscribers.push(subscriber);
    }

    /// Remove the first subscriber that is the same allocation as `subscriber`.
    ///
    /// Returns `false` if it was not connected.
    pub fn disconnect(&mut self, subscriber: &Rc<T>) -> bool {
        match self
            .subscribers
            .iter()
            .position(|s| Rc::ptr_eq(s, subscriber))
        {
            Some(index) => {
                self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Invoke every subscriber through `invoke`, in subscription order.
    ///
    /// `invoke` receives each subscriber in turn and is expected to call it
    /// with the same arguments every time. Returns one result per subscriber,
    /// or an empty list when nothing is connected.
    pub fn call<R>(&self, mut invoke: impl FnMut(&T) -> R) -> Vec<R> {
        self.subscribers.iter().map(|s| invoke(s.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<T: ?Sized> Default for Delegate<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Cloning shares the subscribers, it does not copy them.
impl<T: ?Sized> Clone for Delegate<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Delegate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Callback = dyn Fn(i32) -> i32;

    #[test]
    fn test_call_preserves_subscription_order() {
        let mut delegate: Delegate<Callback> = Delegate::new();
        delegate.connect(Rc::new(|x: i32| x + 1));
        delegate.connect(Rc::new(|x: i32| x * 10));
        delegate.connect(Rc::new(|x: i32| -x));

        assert_eq!(delegate.call(|f| f(3)), vec![4, 30, -3]);
    }

    #[test]
    fn test_call_without_subscribers_is_empty() {
        let delegate: Delegate<Callback> = Delegate::default();
        assert!(delegate.call(|f| f(1)).is_empty());
        assert!(delegate.is_empty());
    }

    #[test]
    fn test_disconnect_removes_first_match_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let shared: Rc<Callback> = Rc::new(move |x: i32| {
            log.borrow_mut().push(x);
            x
        });

        let mut delegate: Delegate<Callback> = Delegate::new();
        delegate.connect(shared.clone());
        delegate.connect(Rc::new(|_: i32| 0));
        delegate.connect(shared.clone());

        assert!(delegate.disconnect(&shared));
        assert_eq!(delegate.len(), 2);
        assert_eq!(delegate.call(|f| f(7)), vec![0, 7]);
        assert_eq!(*seen.borrow(), vec![7]);

        let stranger: Rc<Callback> = Rc::new(|x: i32| x);
        assert!(!delegate.disconnect(&stranger));
        assert_eq!(delegate.len(), 2);
    }

    #[test]
    fn test_clone_shares_subscribers() {
        let mut delegate: Delegate<Callback> = Delegate::new();
        delegate.connect(Rc::new(|x: i32| x + 2));
        let copy = delegate.clone();
        delegate.connect(Rc::new(|x: i32| x));

        assert_eq!(copy.call(|f| f(1)), vec![3]);
        assert_eq!(delegate.call(|f| f(1)), vec![3, 1]);
    }
}
