use std::collections::VecDeque;

use crate::{MarketFeatures, SessionState, Verdict};

/// Errors an [`OracleClient`] implementation may return.
///
/// A decision failure is absorbed by the caller as `no_action` for the step;
/// only a client that cannot be constructed at startup is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The decision source could not be reached (process, socket, model file).
    Unavailable { detail: String },
    /// The decision source answered with something unparseable.
    Malformed { detail: String },
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { detail } => write!(f, "oracle unavailable: {detail}"),
            Self::Malformed { detail } => write!(f, "oracle returned malformed verdict: {detail}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// The external decision source.
///
/// Constructed once at startup and passed into the drivers by reference —
/// never loaded lazily behind a global. The core makes no assumption about
/// how the verdict is produced.
pub trait OracleClient {
    /// Produce a verdict for one step. Implementations own their internal
    /// model state; `&mut self` allows stateful inference.
    fn decide(
        &mut self,
        features: &MarketFeatures,
        session: &SessionState,
    ) -> Result<Verdict, OracleError>;
}

/// Deterministic oracle replaying a pre-loaded verdict sequence.
///
/// Backs tests and verdict-log replay runs: each `decide` pops the next
/// scripted verdict; once the script is exhausted every step is `no_action`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedOracle {
    script: VecDeque<Verdict>,
}

impl ScriptedOracle {
    pub fn new(script: impl IntoIterator<Item = Verdict>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl OracleClient for ScriptedOracle {
    fn decide(
        &mut self,
        _features: &MarketFeatures,
        _session: &SessionState,
    ) -> Result<Verdict, OracleError> {
        Ok(self.script.pop_front().unwrap_or_else(Verdict::no_action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Decision;

    #[test]
    fn scripted_oracle_replays_in_order_then_goes_quiet() {
        let mut oracle = ScriptedOracle::new([Verdict::hold(1, 0.9), Verdict::no_action()]);
        let features = MarketFeatures::new();
        let session = SessionState::initial(10_000.0);

        let first = oracle.decide(&features, &session).unwrap();
        assert_eq!(first.decision, Decision::Hold);
        assert_eq!(first.signal, 1);

        let second = oracle.decide(&features, &session).unwrap();
        assert_eq!(second.decision, Decision::NoAction);

        // Exhausted: keeps answering no_action.
        let third = oracle.decide(&features, &session).unwrap();
        assert_eq!(third.decision, Decision::NoAction);
        assert_eq!(oracle.remaining(), 0);
    }
}
