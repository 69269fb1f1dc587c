pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod health;
pub mod layer;
pub mod metrics;
pub mod middleware;
pub mod response;
pub mod server;
pub mod window;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use config::{Config, GuardConfig};
pub use error::{ConfigurationError, Error, ErrorKind, RateLimitExceeded, Result};
pub use guard::{Admission, AdmissionGuard};
pub use layer::{SlowDownLayer, SlowDownService};
pub use metrics::GuardMetrics;
pub use response::ErrorResponse;
pub use server::create_app;
