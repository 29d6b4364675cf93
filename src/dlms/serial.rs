//! # HAN Serial Byte Source
//!
//! Opens the meter's push port and pumps received chunks into a [`Decoder`].
//! The decoder itself never touches I/O; anything implementing
//! [`AsyncRead`] can stand in for the port.

use crate::constants::{HAN_DEFAULT_BAUD_RATE, HAN_DEFAULT_READ_BUFFER, HAN_DEFAULT_SILENCE_MS};
use crate::dlms::decoder::Decoder;
use crate::dlms::field::FieldSink;
use crate::error::DlmsError;
use crate::util::logging::LogThrottle;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_serial::SerialPortBuilderExt;

/// Configuration for the serial push port (8N1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baudrate: u32,
    /// Quiet period that must precede the first admitted chunk
    pub silence_ms: u64,
    pub read_buffer: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: String::new(),
            baudrate: HAN_DEFAULT_BAUD_RATE,
            silence_ms: HAN_DEFAULT_SILENCE_MS,
            read_buffer: HAN_DEFAULT_READ_BUFFER,
        }
    }
}

impl SerialConfig {
    pub fn silence(&self) -> Duration {
        Duration::from_millis(self.silence_ms)
    }
}

/// Opens `config.port` as an async serial stream.
pub fn open_port(config: &SerialConfig) -> Result<tokio_serial::SerialStream, DlmsError> {
    if config.port.is_empty() {
        return Err(DlmsError::Config("serial port name is empty".into()));
    }
    log::info!("Opening {} at {} baud", config.port, config.baudrate);
    tokio_serial::new(&config.port, config.baudrate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .open_native_async()
        .map_err(|e| DlmsError::SerialPortError(e.to_string()))
}

/// Synchronises to the push cycle after start-up.
///
/// A meter may already be mid-frame when the port opens. Chunks are dropped
/// until one arrives at least `silence` after its predecessor; the gate then
/// stays open.
#[derive(Debug, Clone)]
pub struct SilenceGate {
    silence: Duration,
    last_chunk: Option<Instant>,
    open: bool,
}

impl SilenceGate {
    pub fn new(silence: Duration) -> Self {
        SilenceGate {
            silence,
            last_chunk: None,
            open: silence.is_zero(),
        }
    }

    /// A gate that admits everything.
    pub fn open() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn admit(&mut self) -> bool {
        self.admit_at(Instant::now())
    }

    /// Decide on a chunk received at `now`.
    pub fn admit_at(&mut self, now: Instant) -> bool {
        if self.open {
            return true;
        }
        let quiet = self
            .last_chunk
            .map_or(false, |prev| now.saturating_duration_since(prev) >= self.silence);
        self.last_chunk = Some(now);
        if quiet {
            log::info!("Line quiet for {:?}, decoding", self.silence);
            self.open = true;
        }
        self.open
    }
}

/// Counters returned by [`pump`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub chunks: u64,
    pub chunks_discarded: u64,
    pub bytes_fed: u64,
    pub frame_errors: u64,
}

/// Read `reader` until end of stream, feeding admitted chunks to `decoder`.
pub async fn pump<R, S>(
    reader: &mut R,
    decoder: &mut Decoder<S>,
    gate: &mut SilenceGate,
    read_buffer: usize,
) -> Result<PumpStats, DlmsError>
where
    R: AsyncRead + Unpin,
    S: FieldSink,
{
    let mut stats = PumpStats::default();
    let mut buf = BytesMut::with_capacity(read_buffer.max(1));
    let mut throttle = LogThrottle::new(10_000, 5);

    loop {
        buf.clear();
        let n = reader.read_buf(&mut buf).await?;
        if n == 0 {
            break;
        }
        stats.chunks += 1;

        if !gate.admit() {
            stats.chunks_discarded += 1;
            log::debug!("Discarding {n} bytes while waiting for a quiet line");
            continue;
        }

        let summary = decoder.feed_all(&buf);
        stats.bytes_fed += summary.bytes as u64;
        stats.frame_errors += summary.frame_errors as u64;
        if summary.frame_errors > 0 {
            crate::log_warn_throttled!(
                throttle,
                "{} frame error(s) in chunk of {n} bytes",
                summary.frame_errors
            );
        }
    }

    let suppressed = throttle.take_suppressed();
    if suppressed > 0 {
        log::warn!("{suppressed} frame error warnings suppressed");
    }
    log::info!("Byte source closed after {} chunks", stats.chunks);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.baudrate, 2400);
        assert_eq!(config.silence(), Duration::from_secs(3));
        assert_eq!(config.read_buffer, 1024);
    }

    #[test]
    fn test_open_port_rejects_empty_name() {
        let err = open_port(&SerialConfig::default()).unwrap_err();
        assert!(matches!(err, DlmsError::Config(_)));
    }

    #[test]
    fn test_gate_waits_for_quiet_gap() {
        let mut gate = SilenceGate::new(Duration::from_millis(3000));
        let t0 = Instant::now();
        assert!(!gate.admit_at(t0));
        assert!(!gate.admit_at(t0 + Duration::from_millis(500)));
        assert!(!gate.admit_at(t0 + Duration::from_millis(1500)));
        assert!(gate.admit_at(t0 + Duration::from_millis(4500)));
        assert!(gate.admit_at(t0 + Duration::from_millis(4501)));
        assert!(gate.is_open());
    }

    #[test]
    fn test_zero_silence_opens_immediately() {
        let mut gate = SilenceGate::open();
        assert!(gate.is_open());
        assert!(gate.admit());
    }
}
