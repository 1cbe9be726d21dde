//! Readiness runtime - signal collection and verdict orchestration
//!
//! This crate is the runtime side of readygate:
//! - Queries the three signal providers (service health, capacity, environmental)
//! - Runs them concurrently under one shared deadline
//! - Folds their signals through the deterministic policy in `readygate-core`
//! - Exposes each provider and the full evaluation as JSON tools
//!
//! # Key Types
//!
//! - `SignalProvider` - async trait implemented by every provider (see `providers`)
//! - `ReadinessEvaluator` - concurrent fan-out with deadline and cancellation
//! - `ReadinessRuntime` - evaluator and tool registry wired from `AppConfig`
//!
//! # Failure Principle
//!
//! A provider that cannot reach its source reports `unknown`. It never reports
//! `ok`, and it never aborts the evaluation.

pub mod evaluator;
pub mod providers;
pub mod runtime;
pub mod tools;

pub use evaluator::ReadinessEvaluator;
pub use providers::{SignalProvider, SignalQuery};
pub use runtime::ReadinessRuntime;
pub use tools::{Tool, ToolRegistry};
