//! Driven adapters implementing the domain ports.
//!
//! The relational store, managed cache, vector index, and generative
//! upstreams live outside this repository; what ships here are the
//! in-process implementations used by tests and single-node deployments.

pub mod memory;
