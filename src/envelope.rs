//! Result envelopes for the call surface.
//!
//! Every fallible boundary operation returns a [`CallResult`]: a carrier with
//! exactly one populated branch, success payload or error. The constructors
//! are the only way to build one, so the exclusivity invariant holds by
//! construction. Dropping the envelope releases the occupied branch; the
//! `free_*_result` operations on [`Boundary`](crate::Boundary) exist for
//! callers that keep the original explicit-release discipline.

use crate::error::{Error, ErrorKind};

#[derive(Debug)]
pub struct CallResult<T> {
    ok: Option<T>,
    err: Option<Error>,
}

impl<T> CallResult<T> {
    pub fn ok(value: T) -> Self {
        Self { ok: Some(value), err: None }
    }

    pub fn err(error: Error) -> Self {
        Self { ok: None, err: Some(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.ok.is_some()
    }

    pub fn is_err(&self) -> bool {
        self.err.is_some()
    }

    /// Borrow the success payload, if this is a success envelope.
    pub fn ok_ref(&self) -> Option<&T> {
        self.ok.as_ref()
    }

    /// Borrow the error, if this is an error envelope.
    pub fn err_ref(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    pub fn err_kind(&self) -> Option<ErrorKind> {
        self.err.as_ref().map(Error::kind)
    }

    /// Consume the envelope into a plain `Result`, releasing nothing early.
    pub fn into_result(mut self) -> Result<T, Error> {
        match (self.ok.take(), self.err.take()) {
            (Some(value), None) => Ok(value),
            (None, Some(error)) => Err(error),
            // Unreachable: constructors populate exactly one branch.
            _ => Err(Error::Unknown("envelope with no occupied branch".into())),
        }
    }
}

impl<T> From<Result<T, Error>> for CallResult<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => CallResult::ok(value),
            Err(error) => CallResult::err(error),
        }
    }
}
