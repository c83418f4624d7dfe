//! Request dispatch against the capability registry.

pub mod dispatcher;
pub mod request;
pub mod validate;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use request::{Outcome, Request, Response, ResponseError};
pub use validate::validate_arguments;
