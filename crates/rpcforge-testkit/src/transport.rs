//! A scripted [`Transport`] that replays canned responses instead of
//! touching the network, the way [`rpcforge_runtime::RuntimeComponents`]
//! expects a transport to behave.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rpcforge_runtime::{Transport, TransportError};

/// One scripted outcome for a single `send` call.
pub enum ScriptedResponse {
    /// Return this response.
    Response(http::Response<Bytes>),
    /// Fail with this transport error.
    Error(TransportError),
}

/// Replays a fixed queue of responses/errors in order, one per `send`
/// call. Also records every request it was given, so tests can assert on
/// headers, bodies, and URIs the orchestrator produced.
///
/// Panics if `send` is called more times than the script has entries —
/// an unscripted call means the test under-specified its fixture.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<http::Request<Bytes>>>,
}

impl ScriptedTransport {
    /// Build a transport that replays `script` in order.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self { script: Mutex::new(script.into_iter().collect()), requests: Mutex::new(Vec::new()) }
    }

    /// Build a transport whose single scripted call returns `response`.
    #[must_use]
    pub fn once(response: http::Response<Bytes>) -> Self {
        Self::new([ScriptedResponse::Response(response)])
    }

    /// Every request this transport has seen, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<http::Request<Bytes>> {
        self.requests.lock().iter().map(clone_request).collect()
    }

    /// Number of requests sent so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError> {
        self.requests.lock().push(clone_request(&request));
        let next = self.script.lock().pop_front();
        match next {
            Some(ScriptedResponse::Response(response)) => Ok(clone_response(&response)),
            Some(ScriptedResponse::Error(error)) => Err(error),
            None => panic!("ScriptedTransport: send called with no scripted response remaining"),
        }
    }
}

fn clone_request(request: &http::Request<Bytes>) -> http::Request<Bytes> {
    let mut builder = http::Request::builder().method(request.method()).uri(request.uri());
    for (name, value) in request.headers() {
        builder = builder.header(name, value);
    }
    builder.body(request.body().clone()).expect("cloned request is always valid")
}

fn clone_response(response: &http::Response<Bytes>) -> http::Response<Bytes> {
    let mut builder = http::Response::builder().status(response.status());
    for (name, value) in response.headers() {
        builder = builder.header(name, value);
    }
    builder.body(response.body().clone()).expect("cloned response is always valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> http::Response<Bytes> {
        http::Response::builder().status(status).body(Bytes::from_static(b"{}")).unwrap()
    }

    #[tokio::test]
    async fn replays_scripted_responses_in_order() {
        let transport = ScriptedTransport::new([
            ScriptedResponse::Response(response(200)),
            ScriptedResponse::Response(response(503)),
        ]);
        let request = http::Request::builder().method("GET").uri("https://example.test/").body(Bytes::new()).unwrap();

        let first = transport.send(clone_request(&request)).await.unwrap();
        assert_eq!(first.status(), 200);
        let second = transport.send(clone_request(&request)).await.unwrap();
        assert_eq!(second.status(), 503);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "no scripted response remaining")]
    async fn panics_when_script_is_exhausted() {
        let transport = ScriptedTransport::new([]);
        let request = http::Request::builder().method("GET").uri("https://example.test/").body(Bytes::new()).unwrap();
        let _ = transport.send(request).await;
    }
}
