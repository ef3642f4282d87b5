//! Decoder metrics recorded through the `metrics` facade.
//!
//! No recorder is installed here. Applications that want the numbers install
//! one (for example a Prometheus exporter) and call [`DecoderMetrics::describe`].

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Duration;

/// Completed decodes.
pub const DECODE_TOTAL: &str = "ctc_decode_total";
/// Decodes rejected by the entry contract checks.
pub const DECODE_FAILED_TOTAL: &str = "ctc_decode_failed_total";
/// Wall time of a full decode.
pub const DECODE_DURATION_SECONDS: &str = "ctc_decode_duration_seconds";
/// Timesteps per decode.
pub const DECODE_TIMESTEPS: &str = "ctc_decode_timesteps";
/// Candidate labelings produced per timestep.
pub const BEAM_CANDIDATES: &str = "ctc_beam_candidates";

/// Recording helpers for the beam search decoder.
pub struct DecoderMetrics;

impl DecoderMetrics {
    /// Register descriptions with the installed recorder.
    pub fn describe() {
        describe_counter!(DECODE_TOTAL, "Total number of completed CTC decodes");
        describe_counter!(
            DECODE_FAILED_TOTAL,
            "Total number of decodes rejected by input validation"
        );
        describe_histogram!(
            DECODE_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of a full beam search decode"
        );
        describe_histogram!(
            DECODE_TIMESTEPS,
            Unit::Count,
            "Number of timesteps in each decoded emission matrix"
        );
        describe_histogram!(
            BEAM_CANDIDATES,
            Unit::Count,
            "Candidate labelings in each timestep's beam state"
        );
    }

    /// Record a completed decode.
    pub fn record_decode(duration: Duration, timesteps: usize) {
        counter!(DECODE_TOTAL).increment(1);
        histogram!(DECODE_DURATION_SECONDS).record(duration.as_secs_f64());
        histogram!(DECODE_TIMESTEPS).record(timesteps as f64);
    }

    /// Record a decode rejected at entry.
    pub fn record_failure(reason: &'static str) {
        counter!(DECODE_FAILED_TOTAL, "reason" => reason).increment(1);
    }

    /// Record the size of one timestep's candidate state.
    pub fn record_candidates(count: usize) {
        histogram!(BEAM_CANDIDATES).record(count as f64);
    }
}
