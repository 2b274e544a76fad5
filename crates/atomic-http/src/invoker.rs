use std::fmt;
use std::time::Duration;

use atomic_saga::{RemoteCall, RemoteCallError, RemoteInvoker};
use serde_json::Value;
use tracing::debug;

/// Overall deadline applied to every call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs remote calls over HTTP with a shared blocking agent.
///
/// Any 2xx answer succeeds. Its body is decoded as JSON, an empty body
/// becomes `null` and any other text is returned as a JSON string.
#[derive(Clone)]
pub struct HttpInvoker {
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpInvoker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent, timeout }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for HttpInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpInvoker")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for HttpInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteInvoker for HttpInvoker {
    fn invoke(&self, call: &RemoteCall) -> Result<Value, RemoteCallError> {
        let mut request = self.agent.request(call.method.as_str(), &call.url);
        for (name, value) in &call.headers {
            request = request.set(name, value);
        }

        debug!(method = %call.method, url = %call.url, "sending remote call");
        let response = match &call.body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match response {
            Ok(response) => {
                let status = response.status();
                let text = response
                    .into_string()
                    .map_err(|error| RemoteCallError::Body {
                        method: call.method,
                        url: call.url.clone(),
                        message: error.to_string(),
                    })?;
                debug!(status, bytes = text.len(), "remote call succeeded");
                Ok(decode_body(&text))
            }
            Err(ureq::Error::Status(status, response)) => Err(RemoteCallError::Status {
                method: call.method,
                url: call.url.clone(),
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(RemoteCallError::Transport {
                method: call.method,
                url: call.url.clone(),
                message: transport_message(&transport),
            }),
        }
    }
}

/// Describes a transport failure without the URL, which the error already carries.
fn transport_message(transport: &ureq::Transport) -> String {
    let mut message = transport.kind().to_string();
    if let Some(detail) = transport.message() {
        message.push_str(": ");
        message.push_str(detail);
    }
    if let Some(source) = std::error::Error::source(transport) {
        message.push_str(": ");
        message.push_str(&source.to_string());
    }
    message
}

fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
