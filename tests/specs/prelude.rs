//! Shared helpers for the spec suites

#![allow(dead_code)]

pub use convoy_core::clock::FakeClock;
pub use convoy_core::error::{ErrorInfo, ErrorKind};
pub use convoy_core::progress::ProgressState;
pub use convoy_core::retry::{BackoffConfig, RetryPolicy};
pub use convoy_core::task::{TaskConfig, TaskRequest, TaskResult};
pub use convoy_engine::{
    CoordinationManager, HandlerRegistry, LockOptions, OrchestrationManager, OrchestrationStep,
};
pub use convoy_store::MemoryStore;
pub use serde_json::json;

pub type SpecStore = MemoryStore<FakeClock>;
pub type SpecCoordination = CoordinationManager<SpecStore, HandlerRegistry, FakeClock>;
pub type SpecOrchestration = OrchestrationManager<SpecStore, HandlerRegistry, FakeClock>;

/// Coordination manager over a shared fake clock
pub fn coordination(registry: HandlerRegistry) -> (SpecCoordination, FakeClock) {
    let clock = FakeClock::new();
    let store = MemoryStore::with_clock(clock.clone());
    (
        CoordinationManager::with_clock(store, registry, clock.clone()),
        clock,
    )
}

/// Orchestration manager over a shared fake clock
pub fn orchestration(registry: HandlerRegistry) -> (SpecOrchestration, FakeClock) {
    let clock = FakeClock::new();
    let store = MemoryStore::with_clock(clock.clone());
    (
        OrchestrationManager::with_clock(store, registry, clock.clone()),
        clock,
    )
}

pub fn config(name: &str) -> TaskConfig {
    TaskConfig::builder(name).build().unwrap()
}

pub fn step(id: &str) -> OrchestrationStep {
    OrchestrationStep::new(id, config(id))
}
