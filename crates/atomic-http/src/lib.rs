mod invoker;

pub use invoker::{DEFAULT_TIMEOUT, HttpInvoker};
