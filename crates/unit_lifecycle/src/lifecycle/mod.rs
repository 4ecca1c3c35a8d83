//! Unit lifecycle orchestration
//!
//! [`UnitOrchestrator`] sits on top of the factory and the pool. It keeps an
//! ordered list of preloaded unit types, a cursor into that list for
//! next/previous navigation, and at most one current unit.

pub mod orchestrator;

pub use orchestrator::UnitOrchestrator;

#[cfg(test)]
mod tests;
