//! Fitted/unfitted model state.

use crate::error::{ModelError, Result};

/// Lifecycle of a forecaster: nothing learned yet, or an immutable fitted snapshot.
///
/// Refitting replaces the snapshot wholesale.
#[derive(Debug, Clone, Default)]
pub enum ModelState<F> {
    /// No parameters have been estimated
    #[default]
    Unfit,
    /// Parameters from the most recent successful fit
    Fitted(F),
}

impl<F> ModelState<F> {
    /// The fitted snapshot, or [`ModelError::NotFitted`].
    pub const fn fitted(&self) -> Result<&F> {
        match self {
            Self::Fitted(snapshot) => Ok(snapshot),
            Self::Unfit => Err(ModelError::NotFitted),
        }
    }

    /// Whether a fit has completed.
    pub const fn is_fitted(&self) -> bool {
        matches!(self, Self::Fitted(_))
    }

    /// Store a new snapshot and return a reference to it.
    pub fn replace(&mut self, snapshot: F) -> Result<&F> {
        *self = Self::Fitted(snapshot);
        self.fitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfit_is_state_error() {
        let state: ModelState<u8> = ModelState::default();
        assert!(!state.is_fitted());
        assert!(matches!(state.fitted(), Err(ModelError::NotFitted)));
    }

    #[test]
    fn test_replace() {
        let mut state = ModelState::Unfit;
        assert_eq!(*state.replace(1).unwrap(), 1);
        assert_eq!(*state.replace(2).unwrap(), 2);
        assert!(state.is_fitted());
        assert_eq!(*state.fitted().unwrap(), 2);
    }
}
