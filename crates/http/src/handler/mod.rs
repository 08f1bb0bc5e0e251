//! Request handlers.
//!
//! A [`Handler`] answers a [`Request`] by calling [`Request::send_response`]. Returning
//! without responding gets a `404` from the connection, returning an error gets a `500`.

use std::error::Error;

use crate::protocol::Request;

/// The error a handler may fail with.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub trait Handler: Send + Sync {
    fn call(&self, request: &mut Request<'_>) -> Result<(), HandlerError>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut Request<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    fn call(&self, request: &mut Request<'_>) -> Result<(), HandlerError> {
        (self.f)(request)
    }
}

pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut Request<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    HandlerFn { f }
}
