use slog::{debug, o, trace};
use std::time::Duration;

use crate::metrics::{Ecn, TestbedMetrics};
use crate::packet::PacketBuffer;
use crate::serialize::TelemetryField;
use crate::stamp::{self, StampError};

/// Telemetry state a scheduler embeds in each of its queues.
///
/// The scheduler calls `on_drop` for every packet it drops and
/// `on_dequeue` for every packet it sends, under whatever locking it
/// already uses for the queue.
pub struct TestbedQueue {
    log: slog::Logger,
    metrics: TestbedMetrics,
    stamped: u64,
    skipped: u64,
}

impl TestbedQueue {
    pub fn new(log: slog::Logger, queue_id: u32) -> Self {
        TestbedQueue {
            log: log.new(o!("queue" => queue_id)),
            metrics: TestbedMetrics::new(),
            stamped: 0,
            skipped: 0,
        }
    }

    pub fn metrics(&self) -> &TestbedMetrics {
        &self.metrics
    }

    pub fn stamped(&self) -> u64 {
        self.stamped
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// `tos` is the dropped packet's TOS byte (or IPv6 traffic class).
    pub fn on_drop(&mut self, tos: u8) {
        let ecn = Ecn::from_tos(tos);
        self.metrics.record_drop(ecn.is_ect());
        trace!(self.log, "drop";
            "ecn" => ?ecn,
            "drops_ecn" => self.metrics.drops_ecn(),
            "drops_nonecn" => self.metrics.drops_nonecn(),
        );
    }

    /// Stamp a departing packet with its sojourn time and the drops
    /// seen since the last report. Never fails: unstampable packets are
    /// counted and sent unmodified.
    pub fn on_dequeue<P: PacketBuffer + ?Sized>(
        &mut self,
        pkt: &mut P,
        sojourn: Duration,
    ) -> Option<TelemetryField> {
        let ticks = stamp::qdelay_ticks(sojourn);
        match stamp::try_stamp(pkt, &mut self.metrics, ticks) {
            Ok(field) => {
                self.stamped += 1;
                trace!(self.log, "stamp";
                    "id" => field.as_u16(),
                    "qdelay_ticks" => ticks,
                );
                Some(field)
            }
            Err(e) => {
                self.skipped += 1;
                match e {
                    StampError::HeaderUnavailable { .. } => {
                        debug!(self.log, "stamp skipped"; "reason" => %e)
                    }
                    _ => trace!(self.log, "stamp skipped"; "reason" => %e),
                }
                None
            }
        }
    }
}
