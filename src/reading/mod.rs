//! # Meter Readings
//!
//! Collects decoded fields into one [`MeterReading`] per push frame. The
//! collector is an ordinary [`FieldSink`]; completed readings are queued or
//! sent to a tokio channel so the decoder never waits on a consumer.

pub mod converters;

use crate::dlms::field::{Field, FieldKind, FieldSink};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Snapshot of one push frame. Values are raw meter units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub rms_voltage: [Option<u16>; 3],
    pub rms_current: [Option<u32>; 3],
    pub active_power: [Option<u32>; 3],
    pub reactive_power: [Option<u32>; 3],
    pub power_factor: [Option<u16>; 3],
    pub active_energy_import: Option<u32>,
    pub active_energy_export: Option<u32>,
    pub serial_number: Option<u32>,
    /// Meter clock, present when timestamps are forwarded
    pub meter_time: Option<NaiveDateTime>,
    pub received_at: Option<DateTime<Utc>>,
}

impl MeterReading {
    /// Store a data field. Returns false for fields that carry no reading
    /// value or whose payload has the wrong width.
    pub fn apply(&mut self, field: &Field<'_>) -> bool {
        use converters::{field_u16, field_u32};

        fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
            match value {
                Some(v) => {
                    *slot = Some(v);
                    true
                }
                None => false,
            }
        }

        match field.kind {
            FieldKind::RmsVoltageL1 => set(&mut self.rms_voltage[0], field_u16(field)),
            FieldKind::RmsVoltageL2 => set(&mut self.rms_voltage[1], field_u16(field)),
            FieldKind::RmsVoltageL3 => set(&mut self.rms_voltage[2], field_u16(field)),
            FieldKind::RmsCurrentL1 => set(&mut self.rms_current[0], field_u32(field)),
            FieldKind::RmsCurrentL2 => set(&mut self.rms_current[1], field_u32(field)),
            FieldKind::RmsCurrentL3 => set(&mut self.rms_current[2], field_u32(field)),
            FieldKind::ActivePowerL1 => set(&mut self.active_power[0], field_u32(field)),
            FieldKind::ActivePowerL2 => set(&mut self.active_power[1], field_u32(field)),
            FieldKind::ActivePowerL3 => set(&mut self.active_power[2], field_u32(field)),
            FieldKind::ReactivePowerL1 => set(&mut self.reactive_power[0], field_u32(field)),
            FieldKind::ReactivePowerL2 => set(&mut self.reactive_power[1], field_u32(field)),
            FieldKind::ReactivePowerL3 => set(&mut self.reactive_power[2], field_u32(field)),
            FieldKind::PowerFactorL1 => set(&mut self.power_factor[0], field_u16(field)),
            FieldKind::PowerFactorL2 => set(&mut self.power_factor[1], field_u16(field)),
            FieldKind::PowerFactorL3 => set(&mut self.power_factor[2], field_u16(field)),
            FieldKind::ActiveEnergyImport => set(&mut self.active_energy_import, field_u32(field)),
            FieldKind::ActiveEnergyExport => set(&mut self.active_energy_export, field_u32(field)),
            FieldKind::SerialNumber => set(&mut self.serial_number, field_u32(field)),
            FieldKind::Timestamp => set(&mut self.meter_time, converters::cosem_datetime(field.payload)),
            FieldKind::FrameStart
            | FieldKind::FrameEnd
            | FieldKind::FrameAborted
            | FieldKind::Unrecognized => false,
        }
    }

    /// True when no value was stored.
    pub fn is_empty(&self) -> bool {
        *self
            == MeterReading {
                received_at: self.received_at,
                ..MeterReading::default()
            }
    }
}

/// Collector counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub frames_completed: u64,
    pub frames_aborted: u64,
    pub fields_ignored: u64,
}

/// [`FieldSink`] assembling one [`MeterReading`] per frame.
#[derive(Debug, Default)]
pub struct ReadingCollector {
    current: Option<MeterReading>,
    completed: VecDeque<MeterReading>,
    tx: Option<UnboundedSender<MeterReading>>,
    serial: Option<u32>,
    stats: CollectorStats,
}

impl ReadingCollector {
    /// Collector queueing completed readings internally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector sending completed readings to `tx`.
    pub fn with_sender(tx: UnboundedSender<MeterReading>) -> Self {
        ReadingCollector {
            tx: Some(tx),
            ..Self::default()
        }
    }

    /// Collector plus the receiving end of its channel.
    pub fn channel() -> (Self, UnboundedReceiver<MeterReading>) {
        let (tx, rx) = unbounded_channel();
        (Self::with_sender(tx), rx)
    }

    /// Serial number latched from the first frame carrying one.
    pub fn serial_number(&self) -> Option<u32> {
        self.serial
    }

    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    /// Oldest queued reading.
    pub fn pop(&mut self) -> Option<MeterReading> {
        self.completed.pop_front()
    }

    pub fn drain(&mut self) -> Vec<MeterReading> {
        self.completed.drain(..).collect()
    }

    fn latch_serial(&mut self, field: &Field<'_>) {
        let Some(serial) = field.as_u32() else {
            return;
        };
        match self.serial {
            None => {
                log::info!("Meter serial: {serial}");
                self.serial = Some(serial);
            }
            Some(latched) if latched != serial => {
                log::warn!("Serial already set to {latched}, ignoring {serial}");
            }
            Some(_) => {}
        }
    }

    fn complete(&mut self) {
        let Some(mut reading) = self.current.take() else {
            return;
        };
        reading.serial_number = self.serial;
        reading.received_at = Some(Utc::now());
        self.stats.frames_completed += 1;

        if let Some(tx) = &self.tx {
            if let Err(e) = tx.send(reading) {
                log::warn!("Reading receiver closed, queueing locally");
                self.tx = None;
                self.completed.push_back(e.0);
            }
        } else {
            self.completed.push_back(reading);
        }
    }
}

impl FieldSink for ReadingCollector {
    fn handle(&mut self, field: &Field<'_>) {
        match field.kind {
            FieldKind::FrameStart => {
                if self.current.is_some() {
                    log::debug!("Frame restarted before completion, discarding partial reading");
                }
                self.current = Some(MeterReading::default());
            }
            FieldKind::FrameEnd => self.complete(),
            FieldKind::FrameAborted => {
                self.current = None;
                self.stats.frames_aborted += 1;
            }
            _ => {
                if field.kind == FieldKind::SerialNumber {
                    self.latch_serial(field);
                }
                let stored = self
                    .current
                    .as_mut()
                    .map_or(false, |reading| reading.apply(field));
                if !stored {
                    self.stats.fields_ignored += 1;
                }
            }
        }
    }
}
