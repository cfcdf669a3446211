//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the pipeline and the outside world.
//! Each port is a trait that can be implemented by adapters in the
//! infrastructure layer or by test doubles.

mod clock;
mod session_store;
mod transport;
mod ui;

pub use clock::Clock;
pub use session_store::{SessionStore, StoreError};
pub use transport::{HttpTransport, TransportError};
pub use ui::{Navigator, Notifier};
