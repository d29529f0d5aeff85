//! Behavioural analytics and matching core for the Resonate dating
//! platform.
//!
//! Four engine services make up the core: the profile builder (passive
//! signals into a profile plus semantic vector), the resonance engine
//! (pairwise compatibility scoring), the feed ranker (five-stage discovery
//! pipeline), and the conversation health monitor (trend signals, state
//! machine, nudges). Everything reaches the outside world through the
//! ports in [`domain::ports`]; inbound adapters in [`inbound`] drive the
//! engines from RPC calls and scheduler firings.

pub mod domain;
pub mod inbound;
pub mod outbound;

#[cfg(test)]
pub(crate) mod test_support;
