use super::cell::*;
use super::constant::*;
use super::context::*;
use super::mem::*;
use super::module::*;
use super::port::*;
use super::register::*;

use std::ops::{Add, BitAnd, BitOr, BitXor, Not, Sub};
use std::ptr;

/// The minimum allowed bit width for any given [`Signal`].
///
/// This is currently set to `1`, and is not likely to change in future versions of this library.
pub const MIN_SIGNAL_BIT_WIDTH: u32 = 1;
/// The maximum allowed bit width for any given [`Signal`].
///
/// This is currently set to `128` so that the simulator can hold every value in a native `u128`.
pub const MAX_SIGNAL_BIT_WIDTH: u32 = 128;

/// Represents a collection of 1 or more bits driven by some source.
///
/// A `Signal` can be created by several [`Module`] methods (eg. [`lit`](Module::lit)) or as a result of combining existing `Signal`s (eg. [`concat`](Self::concat)). `Signal`s are local to their respective [`Module`]s.
///
/// A `Signal` behaves similarly to a `wire` in verilog, except that it's always driven.
///
/// # Examples
///
/// ```
/// use sakai::*;
///
/// let c = Context::new();
///
/// let m = c.module("m", "MyModule");
/// let a = m.lit(0xffu8, 8); // 8-bit signal
/// let b = m.input("my_input", 27).value; // 27-bit signal
/// let c = b.bits(7, 0); // 8-bit signal
/// let d = a + c; // 8-bit signal
/// m.output("my_output", d); // 8-bit output driven by d
/// ```
#[must_use]
pub struct Signal<'a> {
    pub(super) context: &'a Context<'a>,
    pub(super) module: &'a Module<'a>,

    pub(crate) data: SignalData<'a>,
}

impl<'a> Signal<'a> {
    /// Returns the bit width of the given `Signal`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sakai::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("m", "MyModule");
    ///
    /// assert_eq!(m.lit(42u32, 7).bit_width(), 7);
    /// assert_eq!(m.input("i", 27).value.bit_width(), 27);
    /// assert_eq!(m.reg("some_reg", 46, "sync").value.bit_width(), 46);
    /// assert_eq!((!m.low()).bit_width(), 1);
    /// assert_eq!((m.lit(25u8, 8) + m.lit(42u8, 8)).bit_width(), 8);
    /// assert_eq!((m.lit(25u8, 8) - m.lit(42u8, 8)).bit_width(), 8);
    /// assert_eq!((m.high() & m.low()).bit_width(), 1);
    /// assert_eq!(m.lit(12u32, 100).bit(30).bit_width(), 1);
    /// assert_eq!(m.lit(1u32, 99).bits(37, 29).bit_width(), 9);
    /// assert_eq!(m.lit(1u32, 20).concat(m.high()).bit_width(), 21);
    /// assert_eq!(m.lit(0xaau32, 8).eq(m.lit(0xaau32, 8)).bit_width(), 1);
    /// assert_eq!(m.low().mux(m.lit(5u32, 4), m.lit(6u32, 4)).bit_width(), 4);
    /// ```
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        match &self.data {
            SignalData::Lit { bit_width, .. } => *bit_width,
            SignalData::Input { data } => data.bit_width,
            SignalData::Output { data } => data.source.bit_width(),
            SignalData::Reg { data } => data.bit_width,
            SignalData::CellOutput { bit_width, .. } => *bit_width,
            SignalData::UnOp { bit_width, .. } => *bit_width,
            SignalData::BinOp { bit_width, .. } => *bit_width,
            SignalData::Bits {
                range_high,
                range_low,
                ..
            } => range_high - range_low + 1,
            SignalData::Concat { lhs, rhs } => lhs.bit_width() + rhs.bit_width(),
            SignalData::Mux { when_true, .. } => when_true.bit_width(),
            SignalData::MemReadPortOutput { mem, .. } => mem.element_bit_width,
        }
    }

    /// Returns the [`Module`] this `Signal` belongs to.
    pub fn module(&self) -> &'a Module<'a> {
        self.module
    }

    /// Creates a `Signal` that represents the value of the single bit of this `Signal` at index `index`, where `index` equal to `0` represents this `Signal`'s least significant bit.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than or equal to this `Signal`'s `bit_width`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sakai::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("m", "MyModule");
    ///
    /// let lit = m.lit(0b0110u32, 4);
    /// let bit_0 = lit.bit(0); // Represents 0
    /// let bit_1 = lit.bit(1); // Represents 1
    /// ```
    pub fn bit(&'a self, index: u32) -> &'a Signal<'a> {
        if index >= self.bit_width() {
            panic!("Attempted to take bit index {} from a signal with a width of {} bits. Bit indices must be in the range [0, {}] for a signal with a width of {} bits.", index, self.bit_width(), self.bit_width() - 1, self.bit_width());
        }
        self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self.module,

            data: SignalData::Bits {
                source: self,
                range_high: index,
                range_low: index,
            },
        })
    }

    /// Creates a `Signal` that represents a contiguous subset of the bits of this `Signal`, starting at `range_low` as the least significant bit and ending at `range_high` as the most significant bit, inclusive.
    ///
    /// # Panics
    ///
    /// Panics if either `range_low` or `range_high` is greater than or equal to the bit width of this `Signal`, or if `range_low` is greater than `range_high`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sakai::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("m", "MyModule");
    ///
    /// let lit = m.lit(0b0110u32, 4);
    /// let bits_210 = lit.bits(2, 0); // Represents 0b110
    /// let bits_321 = lit.bits(3, 1); // Represents 0b011
    /// ```
    pub fn bits(&'a self, range_high: u32, range_low: u32) -> &'a Signal<'a> {
        if range_low >= self.bit_width() {
            panic!("Cannot specify a range of bits where the lower bound is greater than or equal to the number of bits in the source signal. The bounds must be in the range [0, {}] for a signal with a width of {} bits, but a lower bound of {} was given.", self.bit_width() - 1, self.bit_width(), range_low);
        }
        if range_high >= self.bit_width() {
            panic!("Cannot specify a range of bits where the upper bound is greater than or equal to the number of bits in the source signal. The bounds must be in the range [0, {}] for a signal with a width of {} bits, but an upper bound of {} was given.", self.bit_width() - 1, self.bit_width(), range_high);
        }
        if range_low > range_high {
            panic!("Cannot specify a range of bits where the lower bound is greater than the upper bound.");
        }
        self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self.module,

            data: SignalData::Bits {
                source: self,
                range_high,
                range_low,
            },
        })
    }

    /// Creates a `Signal` that represents this `Signal` concatenated with `rhs`.
    ///
    /// `self` represents the upper bits in the resulting `Signal`, and `rhs` represents the lower bits.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `rhs` belong to different [`Module`]s, or if `self.bit_width() + rhs.bit_width()` is greater than [`MAX_SIGNAL_BIT_WIDTH`].
    ///
    /// # Examples
    ///
    /// ```
    /// use sakai::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("m", "MyModule");
    ///
    /// let lhs = m.lit(0b101u32, 3);
    /// let rhs = m.lit(0b110u32, 3);
    /// let combined = lhs.concat(rhs); // Represents 0b101110
    /// ```
    pub fn concat(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        if !ptr::eq(self.module, rhs.module) {
            panic!("Attempted to combine signals from different modules.");
        }
        let target_bit_width = self.bit_width() + rhs.bit_width();
        if target_bit_width > MAX_SIGNAL_BIT_WIDTH {
            panic!("Attempted to concatenate signals with {} bit(s) and {} bit(s) respectively, but this would result in a bit width of {}, which is greater than the maximum signal bit width of {} bit(s).", self.bit_width(), rhs.bit_width(), target_bit_width, MAX_SIGNAL_BIT_WIDTH);
        }
        self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self.module,

            data: SignalData::Concat { lhs: self, rhs },
        })
    }

    /// Creates a 1-bit `Signal` that represents whether or not `self` and `rhs` are equal.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `rhs` belong to different [`Module`]s, or if the bit widths of `self` and `rhs` aren't equal.
    ///
    /// # Examples
    ///
    /// ```
    /// use sakai::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("m", "MyModule");
    ///
    /// let lit_a = m.lit(0b011u32, 3);
    /// let lit_b = m.lit(0b110u32, 3);
    /// let a_eq_b = lit_a.eq(lit_b); // Represents 0
    /// ```
    pub fn eq(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::Equal, 1)
    }

    /// Creates a 1-bit `Signal` that represents whether or not `self` and `rhs` are not equal.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `rhs` belong to different [`Module`]s, or if the bit widths of `self` and `rhs` aren't equal.
    pub fn ne(&'a self, rhs: &'a Signal<'a>) -> &'a Signal<'a> {
        self.bin_op(rhs, BinOp::NotEqual, 1)
    }

    /// Creates a `Signal` that represents `when_true` if `self` is high, and `when_false` otherwise.
    ///
    /// # Panics
    ///
    /// Panics if any of the signals belong to different [`Module`]s, if `self` isn't 1 bit wide, or if `when_true` and `when_false` have different bit widths.
    ///
    /// # Examples
    ///
    /// ```
    /// use sakai::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("m", "MyModule");
    ///
    /// let cond = m.input("cond", 1).value;
    /// let a = m.input("a", 8).value;
    /// let b = m.input("b", 8).value;
    /// m.output("my_output", cond.mux(a, b)); // Outputs a when cond is high, b otherwise
    /// ```
    pub fn mux(&'a self, when_true: &'a Signal<'a>, when_false: &'a Signal<'a>) -> &'a Signal<'a> {
        if !ptr::eq(self.module, when_true.module) || !ptr::eq(self.module, when_false.module) {
            panic!("Attempted to combine signals from different modules.");
        }
        if self.bit_width() != 1 {
            panic!(
                "Multiplexer conditionals can only be 1 bit wide, but a {}-bit conditional was given.",
                self.bit_width()
            );
        }
        if when_true.bit_width() != when_false.bit_width() {
            panic!(
                "Cannot multiplex signals with different bit widths ({} and {}, respectively).",
                when_true.bit_width(),
                when_false.bit_width()
            );
        }
        self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self.module,

            data: SignalData::Mux {
                cond: self,
                when_true,
                when_false,
            },
        })
    }

    fn bin_op(&'a self, rhs: &'a Signal<'a>, op: BinOp, bit_width: u32) -> &'a Signal<'a> {
        if !ptr::eq(self.module, rhs.module) {
            panic!("Attempted to combine signals from different modules.");
        }
        if self.bit_width() != rhs.bit_width() {
            panic!(
                "Signals have different bit widths ({} and {}, respectively).",
                self.bit_width(),
                rhs.bit_width()
            );
        }
        self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self.module,

            data: SignalData::BinOp {
                bit_width,
                lhs: self,
                rhs,
                op,
            },
        })
    }
}

pub(crate) enum SignalData<'a> {
    Lit {
        value: Constant,
        bit_width: u32,
    },

    Input {
        data: &'a InputData<'a>,
    },
    // A child module's output, seen from the parent
    Output {
        data: &'a OutputData<'a>,
    },

    Reg {
        data: &'a RegisterData<'a>,
    },

    CellOutput {
        cell: &'a Cell<'a>,
        port: String,
        bit_width: u32,
    },

    UnOp {
        source: &'a Signal<'a>,
        op: UnOp,
        bit_width: u32,
    },
    BinOp {
        bit_width: u32,
        lhs: &'a Signal<'a>,
        rhs: &'a Signal<'a>,
        op: BinOp,
    },

    Bits {
        source: &'a Signal<'a>,
        range_high: u32,
        range_low: u32,
    },

    Concat {
        lhs: &'a Signal<'a>,
        rhs: &'a Signal<'a>,
    },

    Mux {
        cond: &'a Signal<'a>,
        when_true: &'a Signal<'a>,
        when_false: &'a Signal<'a>,
    },

    MemReadPortOutput {
        mem: &'a Mem<'a>,
        domain: String,
        address: &'a Signal<'a>,
        enable: &'a Signal<'a>,
    },
}

impl<'a> Add for &'a Signal<'a> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::Add, self.bit_width())
    }
}

impl<'a> Sub for &'a Signal<'a> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::Sub, self.bit_width())
    }
}

impl<'a> BitAnd for &'a Signal<'a> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::BitAnd, self.bit_width())
    }
}

impl<'a> BitOr for &'a Signal<'a> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::BitOr, self.bit_width())
    }
}

impl<'a> BitXor for &'a Signal<'a> {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        self.bin_op(rhs, BinOp::BitXor, self.bit_width())
    }
}

impl<'a> Not for &'a Signal<'a> {
    type Output = Self;

    fn not(self) -> Self {
        self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self.module,

            data: SignalData::UnOp {
                source: self,
                op: UnOp::Not,
                bit_width: self.bit_width(),
            },
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum UnOp {
    Not,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum BinOp {
    Add,
    BitAnd,
    BitOr,
    BitXor,
    Equal,
    NotEqual,
    Sub,
}
