/// Receives optimizer events and optionally steers the run.
///
/// Observers let callers watch iterations, record histories, or stop a run
/// early without the optimizer knowing anything about them.
///
/// Returning `Some(action)` requests an optimizer-specific action; `None`
/// lets the iteration continue untouched.
///
/// Closures implement `Observer` automatically, and `()` is the no-op observer.
pub trait Observer<E, A> {
    /// Observes an event and optionally returns a control action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
