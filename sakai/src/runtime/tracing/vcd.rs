//! [VCD](https://en.wikipedia.org/wiki/Value_change_dump) format tracing implementation.

extern crate vcd;

use super::*;

use std::io;

/// The unit of a [`VcdTrace`]'s time stamps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeScaleUnit {
    S,
    Ms,
    Us,
    Ns,
    Ps,
    Fs,
}

impl From<TimeScaleUnit> for vcd::TimescaleUnit {
    fn from(time_scale_unit: TimeScaleUnit) -> Self {
        match time_scale_unit {
            TimeScaleUnit::S => vcd::TimescaleUnit::S,
            TimeScaleUnit::Ms => vcd::TimescaleUnit::MS,
            TimeScaleUnit::Us => vcd::TimescaleUnit::US,
            TimeScaleUnit::Ns => vcd::TimescaleUnit::NS,
            TimeScaleUnit::Ps => vcd::TimescaleUnit::PS,
            TimeScaleUnit::Fs => vcd::TimescaleUnit::FS,
        }
    }
}

/// A [`Trace`] that writes a VCD file to `W`.
///
/// Only changes are dumped: a signal is written the first time it's updated and then whenever its value differs from the last one written, and a time stamp is only written when something changed at it.
///
/// # Examples
///
/// ```
/// use sakai::runtime::tracing::vcd::*;
/// use sakai::sim::*;
/// use sakai::*;
///
/// let c = Context::new();
///
/// let m = c.module("m", "Toggle");
/// let t = m.reg("t", 1, "sync");
/// t.drive_next(!t.value);
/// m.output("t", t.value);
///
/// let mut sim = Simulator::new(m).unwrap();
///
/// let mut buf = Vec::new();
/// {
///     let trace = VcdTrace::new(&mut buf, 1, TimeScaleUnit::Ns).unwrap();
///     let mut tracer = sim.trace(trace).unwrap();
///
///     for time_stamp in 0..4 {
///         tracer.update(&sim, time_stamp * 10).unwrap();
///         sim.posedge("sync");
///     }
/// }
///
/// let vcd = String::from_utf8(buf).unwrap();
/// assert!(vcd.contains("#30"));
/// ```
pub struct VcdTrace<W: io::Write> {
    scope_depth: u32,
    pending_time_stamp: Option<u64>,

    signals: Vec<VcdTraceSignal>,

    w: vcd::Writer<W>,
}

struct VcdTraceSignal {
    bit_width: u32,
    type_: TraceValueType,
    id: vcd::IdCode,
    last: Option<u128>,
}

impl<W: io::Write> VcdTrace<W> {
    /// Creates a `VcdTrace` writing to `w`, whose time stamps count in steps of `time_scale` `time_scale_unit`s.
    ///
    /// # Errors
    ///
    /// Returns any error produced while writing the header to `w`.
    pub fn new(w: W, time_scale: u32, time_scale_unit: TimeScaleUnit) -> io::Result<VcdTrace<W>> {
        let mut w = vcd::Writer::new(w);
        w.timescale(time_scale, time_scale_unit.into())?;

        Ok(VcdTrace {
            scope_depth: 0,
            pending_time_stamp: None,

            signals: Vec::new(),

            w,
        })
    }

    fn write_value(&mut self, signal_id: usize, value: u128) -> io::Result<()> {
        if let Some(time_stamp) = self.pending_time_stamp.take() {
            self.w.timestamp(time_stamp)?;
        }

        let signal = &mut self.signals[signal_id];
        signal.last = Some(value);
        match signal.type_ {
            TraceValueType::Bool => self.w.change_scalar(signal.id, value != 0),
            _ => self
                .w
                .change_vector(signal.id, &vector_value(value, signal.bit_width)[..]),
        }
    }
}

/// `value`'s low `bit_width` bits, most significant bit first.
fn vector_value(value: u128, bit_width: u32) -> Vec<vcd::Value> {
    (0..bit_width)
        .rev()
        .map(|index| ((value >> index) & 1 != 0).into())
        .collect()
}

impl<W: io::Write> Trace for VcdTrace<W> {
    type SignalId = usize;

    fn push_module(&mut self, name: &str) -> io::Result<()> {
        self.w.add_module(name)?;
        self.scope_depth += 1;
        Ok(())
    }

    fn pop_module(&mut self) -> io::Result<()> {
        self.w.upscope()?;
        self.scope_depth -= 1;
        if self.scope_depth == 0 {
            self.w.enddefinitions()?;
        }
        Ok(())
    }

    fn add_signal(
        &mut self,
        name: &str,
        bit_width: u32,
        type_: TraceValueType,
    ) -> io::Result<Self::SignalId> {
        let id = self.w.add_wire(bit_width, name)?;
        self.signals.push(VcdTraceSignal {
            bit_width,
            type_,
            id,
            last: None,
        });
        Ok(self.signals.len() - 1)
    }

    fn update_time_stamp(&mut self, time_stamp: u64) -> io::Result<()> {
        self.pending_time_stamp = Some(time_stamp);
        Ok(())
    }

    fn update_signal(&mut self, signal_id: &Self::SignalId, value: TraceValue) -> io::Result<()> {
        let value = value.bits();
        if self.signals[*signal_id].last == Some(value) {
            return Ok(());
        }
        self.write_value(*signal_id, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_stamps(vcd: &str) -> Vec<&str> {
        vcd.lines().filter(|line| line.starts_with('#')).collect()
    }

    #[test]
    fn vector_values_msb_first() {
        assert_eq!(
            vector_value(0b0110, 4),
            vec![
                vcd::Value::V0,
                vcd::Value::V1,
                vcd::Value::V1,
                vcd::Value::V0
            ]
        );
    }

    #[test]
    fn only_changes_are_dumped() {
        let mut buf = Vec::new();
        {
            let mut trace = VcdTrace::new(&mut buf, 1, TimeScaleUnit::Ns).unwrap();
            trace.push_module("top").unwrap();
            let a = trace.add_signal("a", 1, TraceValueType::Bool).unwrap();
            let b = trace.add_signal("b", 8, TraceValueType::U32).unwrap();
            trace.pop_module().unwrap();

            for (time_stamp, a_value, b_value) in
                [(0, false, 5), (10, false, 5), (20, true, 5), (30, true, 5)]
            {
                trace.update_time_stamp(time_stamp).unwrap();
                trace.update_signal(&a, TraceValue::Bool(a_value)).unwrap();
                trace.update_signal(&b, TraceValue::U32(b_value)).unwrap();
            }
        }

        let vcd = String::from_utf8(buf).unwrap();
        assert!(vcd.contains("top"));
        assert_eq!(time_stamps(&vcd), vec!["#0", "#20"]);
        assert_eq!(vcd.lines().filter(|line| line.starts_with('b')).count(), 1);
    }
}
