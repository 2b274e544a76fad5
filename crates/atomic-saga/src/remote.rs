use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::definition::{ApiCallDef, HttpMethod};
use crate::error::RemoteCallError;

/// A fully resolved remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub method: HttpMethod,
    pub url: String,
    /// Request body; always `None` for `GET`.
    pub body: Option<Value>,
    pub headers: IndexMap<String, String>,
}

impl RemoteCall {
    /// Builds the call for `def` against an already templated `url`.
    ///
    /// `payload` becomes the body unless the method is `GET`.
    #[must_use]
    pub fn new(def: &ApiCallDef, url: String, payload: &Value) -> Self {
        let method = def.method();
        Self {
            method,
            url,
            body: method.carries_body().then(|| payload.clone()),
            headers: def.headers().clone(),
        }
    }
}

/// Performs remote calls for execute and rollback alike.
pub trait RemoteInvoker: Send + Sync {
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    fn invoke(&self, call: &RemoteCall) -> Result<Value, RemoteCallError>;
}

impl<T: RemoteInvoker + ?Sized> RemoteInvoker for Arc<T> {
    fn invoke(&self, call: &RemoteCall) -> Result<Value, RemoteCallError> {
        (**self).invoke(call)
    }
}

impl<T: RemoteInvoker + ?Sized> RemoteInvoker for Box<T> {
    fn invoke(&self, call: &RemoteCall) -> Result<Value, RemoteCallError> {
        (**self).invoke(call)
    }
}
