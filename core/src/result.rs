//! The success/failure channel shared by every Geocore operation.
//!
//! `Result<T>` is the standard library's tagged union specialised to
//! `GeocoreError`. `ResultExt` adds the accessors the callback surface works
//! with, most importantly `propagate`, which routes a finished result into a
//! fulfill/reject pair.

use crate::error::GeocoreError;

pub type Result<T, E = GeocoreError> = std::result::Result<T, E>;

pub trait ResultExt<T> {
    fn is_failure(&self) -> bool;

    fn error_if_any(&self) -> Option<&GeocoreError>;

    fn value_if_any(&self) -> Option<&T>;

    /// Hand the value to `fulfill` or the error to `reject`. Exactly one of
    /// the two is called, exactly once.
    fn propagate<F, R>(self, fulfill: F, reject: R)
    where
        F: FnOnce(T),
        R: FnOnce(GeocoreError);
}

impl<T> ResultExt<T> for Result<T> {
    fn is_failure(&self) -> bool {
        self.is_err()
    }

    fn error_if_any(&self) -> Option<&GeocoreError> {
        self.as_ref().err()
    }

    fn value_if_any(&self) -> Option<&T> {
        self.as_ref().ok()
    }

    fn propagate<F, R>(self, fulfill: F, reject: R)
    where
        F: FnOnce(T),
        R: FnOnce(GeocoreError),
    {
        match self {
            Ok(value) => fulfill(value),
            Err(err) => reject(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn accessors_on_success() {
        let result: Result<u32> = Ok(7);
        assert!(!result.is_failure());
        assert_eq!(result.value_if_any(), Some(&7));
        assert!(result.error_if_any().is_none());
    }

    #[test]
    fn accessors_on_failure() {
        let result: Result<u32> = Err(GeocoreError::TokenUndefined);
        assert!(result.is_failure());
        assert!(result.value_if_any().is_none());
        assert!(matches!(result.error_if_any(), Some(GeocoreError::TokenUndefined)));
    }

    #[test]
    fn propagate_routes_to_one_channel() {
        let seen = RefCell::new(Vec::new());

        let ok: Result<&str> = Ok("token");
        ok.propagate(
            |v| seen.borrow_mut().push(format!("fulfill:{v}")),
            |e| seen.borrow_mut().push(format!("reject:{e}")),
        );

        let err: Result<&str> = Err(GeocoreError::UnauthorizedAccess);
        err.propagate(
            |v| seen.borrow_mut().push(format!("fulfill:{v}")),
            |e| seen.borrow_mut().push(format!("reject:{e}")),
        );

        assert_eq!(
            seen.into_inner(),
            vec!["fulfill:token".to_string(), "reject:unauthorized access".to_string()]
        );
    }
}
