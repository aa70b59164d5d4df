//! A scripted [`Poller`] for exercising the waiter engine without a real
//! operation behind it.

use std::collections::VecDeque;

use rpcforge_waiter::{PollResult, Poller};

/// Replays a fixed queue of poll outcomes, one per `poll()` call.
///
/// Panics once the queue is empty, the same "script ran out" contract as
/// [`crate::ScriptedTransport`].
pub struct ScriptedPoller {
    results: VecDeque<PollResult>,
}

impl ScriptedPoller {
    /// Build a poller that replays `results` in order.
    #[must_use]
    pub fn new(results: impl IntoIterator<Item = PollResult>) -> Self {
        Self { results: results.into_iter().collect() }
    }
}

impl Poller for ScriptedPoller {
    fn poll(&mut self) -> PollResult {
        self.results.pop_front().expect("ScriptedPoller: poll called with no scripted result remaining")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcforge_serde::Document;

    #[test]
    fn replays_in_order() {
        let mut poller = ScriptedPoller::new([
            PollResult::Output(Document::Null),
            PollResult::Error { shape_id: "demo#NotReady".to_string() },
        ]);
        assert!(matches!(poller.poll(), PollResult::Output(Document::Null)));
        assert!(matches!(poller.poll(), PollResult::Error { .. }));
    }
}
