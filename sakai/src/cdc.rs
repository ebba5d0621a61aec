//! Clock domain crossing primitives.
//!
//! Each primitive is a generator: it's configured and validated once with `new`, and then [elaborated](MultiReg::elaborate) into a child [`Module`] of some parent. Elaboration takes a [`Platform`], which may substitute its own implementation of the synchronizer chains.
//!
//! | Primitive | Use |
//! |-----------|-----|
//! | [`MultiReg`] | Resynchronize a level signal into another domain. No atomicity across bits. |
//! | [`ResetSynchronizer`] | Assert a domain's reset asynchronously, deassert it synchronously. |
//! | [`PulseSynchronizer`] | Carry single-cycle pulses across domains with toggle encoding. |
//! | [`BusSynchronizer`] | Carry a multi-bit word atomically with a request/acknowledge handshake. |
//! | [`ElasticBuffer`] | Stream words between domains of equal frequency through a dual-port memory. |
//! | [`Gearbox`] | Stream data between frequency-locked domains of different widths. |
//!
//! None of these primitives can check the clocking preconditions they rely on; those are documented on each primitive and are the responsibility of the design using them.

mod bus_synchronizer;
mod elastic_buffer;
mod error;
mod gearbox;
mod multi_reg;
mod platform;
mod pulse_synchronizer;
mod reset_synchronizer;

pub use bus_synchronizer::*;
pub use elastic_buffer::*;
pub use error::ConfigError;
pub use gearbox::*;
pub use multi_reg::*;
pub use platform::*;
pub use pulse_synchronizer::*;
pub use reset_synchronizer::*;

use crate::{Input, Module, Output, Signal};

/// The ports of an elaborated primitive with a data input and output.
pub struct Ports<'a> {
    /// The module the primitive was elaborated into.
    pub module: &'a Module<'a>,
    /// The primitive's input, to be driven from the parent module.
    pub i: &'a Input<'a>,
    /// The primitive's output, observable from the parent module with [`Output::value`].
    pub o: &'a Output<'a>,
}

fn default_domain() -> String {
    "sync".to_string()
}

/// The number of bits needed to represent every value in `0..=n`.
pub(crate) fn bits_for(n: u32) -> u32 {
    (32 - n.leading_zeros()).max(1)
}

/// `ptr + 1`, wrapping to `0` after `modulo - 1`.
pub(crate) fn incr<'a>(m: &'a Module<'a>, ptr: &'a Signal<'a>, modulo: u32) -> &'a Signal<'a> {
    let bit_width = ptr.bit_width();
    let next = ptr + m.lit(1u32, bit_width);
    if bit_width < 64 && u64::from(modulo) == 1u64 << bit_width {
        next
    } else {
        ptr.eq(m.lit(modulo - 1, bit_width))
            .mux(m.lit(0u32, bit_width), next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    #[test]
    fn bits_for_values() {
        assert_eq!(bits_for(0), 1);
        assert_eq!(bits_for(1), 1);
        assert_eq!(bits_for(2), 2);
        assert_eq!(bits_for(3), 2);
        assert_eq!(bits_for(4), 3);
        assert_eq!(bits_for(127), 7);
        assert_eq!(bits_for(128), 8);
        assert_eq!(bits_for(u32::MAX), 32);
    }

    #[test]
    fn incr_power_of_two_is_plain_add() {
        let c = Context::new();

        let m = c.module("a", "A");
        let ptr = m.reg("ptr", 2, "sync");

        let next = incr(m, ptr.value, 4);
        assert!(matches!(
            next.data,
            crate::graph::signal::SignalData::BinOp { .. }
        ));

        let next = incr(m, ptr.value, 3);
        assert!(matches!(
            next.data,
            crate::graph::signal::SignalData::Mux { .. }
        ));
    }
}
