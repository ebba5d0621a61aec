//! Waveform tracing for [`Simulator`](crate::sim::Simulator)s.

pub mod vcd;

use std::io;

/// A traced signal value, stored in the smallest type that holds the signal's bit width.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraceValue {
    /// Contains a boolean value
    Bool(bool),
    /// Contains an unsigned, 32-bit value
    U32(u32),
    /// Contains an unsigned, 64-bit value
    U64(u64),
    /// Contains an unsigned, 128-bit value
    U128(u128),
}

impl TraceValue {
    /// Stores the low `bit_width` bits of `value` as the type [`TraceValueType::from_bit_width`] picks for `bit_width`.
    pub fn from_bits(value: u128, bit_width: u32) -> TraceValue {
        match TraceValueType::from_bit_width(bit_width) {
            TraceValueType::Bool => TraceValue::Bool(value & 1 != 0),
            TraceValueType::U32 => TraceValue::U32(value as u32),
            TraceValueType::U64 => TraceValue::U64(value as u64),
            TraceValueType::U128 => TraceValue::U128(value),
        }
    }

    /// The value, widened to a `u128`.
    pub fn bits(&self) -> u128 {
        match *self {
            TraceValue::Bool(value) => value.into(),
            TraceValue::U32(value) => value.into(),
            TraceValue::U64(value) => value.into(),
            TraceValue::U128(value) => value,
        }
    }
}

/// The type a traced signal's values are stored in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraceValueType {
    Bool,
    U32,
    U64,
    U128,
}

impl TraceValueType {
    /// The smallest type that holds `bit_width` bits.
    pub fn from_bit_width(bit_width: u32) -> TraceValueType {
        match bit_width {
            0..=1 => TraceValueType::Bool,
            2..=32 => TraceValueType::U32,
            33..=64 => TraceValueType::U64,
            _ => TraceValueType::U128,
        }
    }
}

/// A sink for simulated signal values, fed by a [`Tracer`](crate::sim::Tracer).
///
/// Signals are declared first, nested in `push_module`/`pop_module` calls that mirror the module hierarchy. Declaration ends when the outermost module is popped. Values are then recorded one time stamp at a time: `update_time_stamp`, followed by `update_signal` for every declared signal.
pub trait Trace {
    type SignalId;

    fn push_module(&mut self, name: &str) -> io::Result<()>;
    fn pop_module(&mut self) -> io::Result<()>;
    fn add_signal(
        &mut self,
        name: &str,
        bit_width: u32,
        type_: TraceValueType,
    ) -> io::Result<Self::SignalId>;

    fn update_time_stamp(&mut self, time_stamp: u64) -> io::Result<()>;
    fn update_signal(&mut self, signal_id: &Self::SignalId, value: TraceValue) -> io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_types_by_bit_width() {
        assert_eq!(TraceValueType::from_bit_width(1), TraceValueType::Bool);
        assert_eq!(TraceValueType::from_bit_width(2), TraceValueType::U32);
        assert_eq!(TraceValueType::from_bit_width(32), TraceValueType::U32);
        assert_eq!(TraceValueType::from_bit_width(33), TraceValueType::U64);
        assert_eq!(TraceValueType::from_bit_width(64), TraceValueType::U64);
        assert_eq!(TraceValueType::from_bit_width(65), TraceValueType::U128);
        assert_eq!(TraceValueType::from_bit_width(128), TraceValueType::U128);
    }

    #[test]
    fn values_from_bits() {
        assert_eq!(TraceValue::from_bits(1, 1), TraceValue::Bool(true));
        assert_eq!(TraceValue::from_bits(0xab, 8), TraceValue::U32(0xab));
        assert_eq!(
            TraceValue::from_bits(0x1_0000_0000, 40),
            TraceValue::U64(0x1_0000_0000)
        );
        assert_eq!(TraceValue::from_bits(u128::MAX, 128).bits(), u128::MAX);
        assert_eq!(TraceValue::Bool(true).bits(), 1);
    }
}
