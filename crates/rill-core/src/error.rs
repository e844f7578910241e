#![forbid(unsafe_code)]

//! The error notification carried through a stream.
//!
//! A producer signals failure by delivering a [`StreamError`] to the error
//! reaction of its consumer; nothing is thrown. Operators forward the value
//! unchanged, so it must be cheap to clone: the `Source` variant shares the
//! underlying error behind an `Rc`.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// Terminal error notification.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// A plain message raised by a producer or a user callback.
    #[error("{message}")]
    Message {
        /// Human-readable description.
        message: String,
    },

    /// An error value from outside the engine, shared between every
    /// consumer that receives it.
    #[error("source error: {0}")]
    Source(SharedError),
}

impl StreamError {
    /// Build a message error.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error value.
    #[must_use]
    pub fn source_error(err: impl Error + 'static) -> Self {
        Self::Source(SharedError(Rc::new(err)))
    }

    /// Short stable label (snake_case) for logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Message { .. } => "stream_message",
            Self::Source(_) => "stream_source",
        }
    }
}

impl PartialEq for StreamError {
    /// Messages compare by text; wrapped errors compare by identity, so an
    /// error forwarded through a chain is equal to the one that was raised.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Message { message: a }, Self::Message { message: b }) => a == b,
            (Self::Source(a), Self::Source(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

/// Reference-counted handle to a foreign error.
#[derive(Clone)]
pub struct SharedError(Rc<dyn Error>);

impl SharedError {
    /// Borrow the wrapped error.
    #[must_use]
    pub fn get(&self) -> &(dyn Error + 'static) {
        &*self.0
    }
}

impl fmt::Debug for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}
