//! Shared test doubles for the bootstrap suites.

mod executor;
mod logs;
mod reporter;
mod store;
mod world;

use std::cell::RefCell;

pub use executor::RecordingExecutor;
pub use logs::{capture_logs, warning_lines};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use store::{FixedStoreProvider, StubStore};
pub use world::TestWorld;

/// Fresh scenario world.
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
