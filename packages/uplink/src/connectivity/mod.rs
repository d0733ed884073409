mod engine;
mod machine;
mod manager;
mod policy;
mod readiness;
mod state;

pub use manager::{ConnectivityManager, LinkEventChannel, NetworkControl};
pub use policy::RetryPolicy;
pub use readiness::Readiness;
pub use state::{LinkCounters, LinkEvent, LinkState};
