//! Adapters implementing the application ports.

mod console;
mod reqwest_transport;
mod system_clock;

pub use console::{MemoryNavigator, TracingNotifier};
pub use reqwest_transport::ReqwestTransport;
pub use system_clock::SystemClock;
