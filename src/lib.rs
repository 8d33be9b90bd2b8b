//! Queue telemetry for the testbed schedulers.
//!
//! A scheduler keeps one `TestbedMetrics` (or a `TestbedQueue`, which
//! wraps it with logging) per queue. Drops are counted per ECN domain,
//! and every departing IPv4 packet carries, in its identification field,
//! the drops since the last report and its own queueing delay. The
//! traffic analyzer recovers both from captures with
//! `serialize::TelemetryField`.
//!
//! Both values are stored as compact floats (see `float`), and the
//! header checksum is patched incrementally (see `checksum`).

#[macro_use]
extern crate arrayref;
extern crate bytes;
extern crate failure;
extern crate slog;
extern crate slog_async;
extern crate slog_term;

pub mod checksum;
pub mod float;
pub mod metrics;
pub mod packet;
pub mod queue;
pub mod serialize;
pub mod stamp;

pub use self::metrics::{Ecn, TestbedMetrics};
pub use self::queue::TestbedQueue;
pub use self::serialize::{Telemetry, TelemetryField};
pub use self::stamp::{stamp, try_stamp, StampError};

pub const MAC_HEADER_LENGTH: usize = 14;
pub const IP_HEADER_LENGTH: usize = 20;
pub const IPV6_HEADER_LENGTH: usize = 40;

/// Terminal logger for the command line tools.
pub fn make_logger() -> slog::Logger {
    use slog::Drain;

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, slog::o!())
}
