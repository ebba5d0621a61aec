/// An unsigned value for literals, register reset values, and memory contents.
///
/// Graph APIs take `impl Into<Constant>`, so `bool`s and Rust's unsigned integer types can be passed as-is; every one of them widens losslessly to the `u128` stored here.
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
/// let a = m.lit(true, 16);
/// let b = m.lit(0xdeadbeefu32, 47);
/// let r = m.reg("data", 20, "sync");
/// r.default_value(5u8);
///
/// assert_eq!(Constant::from(0xdeadbeefu32).required_bits(), 32);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Constant(u128);

impl Constant {
    /// The value, widened to a `u128`.
    pub fn value(self) -> u128 {
        self.0
    }

    /// The narrowest bit width that can hold this value. Zero needs no bits at all.
    pub fn required_bits(self) -> u32 {
        128 - self.0.leading_zeros()
    }

    /// Returns `true` if this value can be stored in `bit_width` bits without truncation.
    pub fn fits(self, bit_width: u32) -> bool {
        self.required_bits() <= bit_width
    }
}

macro_rules! constant_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Constant {
                fn from(value: $t) -> Self {
                    Constant(value.into())
                }
            }
        )*
    };
}

constant_from!(bool, u8, u16, u32, u64, u128);
