use crate::error::Error;

/// A value that is loaded in the background.  `D` identifies the request the
/// promise currently waits on.
#[derive(Clone, Debug)]
pub enum Promise<T, D = (), E = Error> {
    Empty,
    Deferred(D),
    Resolved(T),
    Rejected(E),
}

impl<T, D: PartialEq, E> Promise<T, D, E> {
    pub fn is_deferred(&self, def: &D) -> bool {
        matches!(self, Self::Deferred(pending) if pending == def)
    }

    /// Wait on `def` from now on.  Whatever was loaded before is dropped.
    pub fn defer(&mut self, def: D) {
        *self = Self::Deferred(def);
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Self::Resolved(val) => Some(val),
            _ => None,
        }
    }

    pub fn resolved_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Resolved(val) => Some(val),
            _ => None,
        }
    }

    /// Settle the promise with the outcome of request `def`.  Outcomes of
    /// superseded requests are ignored and `false` is returned.
    pub fn update(&mut self, (def, res): (D, Result<T, E>)) -> bool {
        if !self.is_deferred(&def) {
            return false;
        }
        *self = res.map_or_else(Self::Rejected, Self::Resolved);
        true
    }
}

impl<T, D, E> Default for Promise<T, D, E> {
    fn default() -> Self {
        Self::Empty
    }
}
