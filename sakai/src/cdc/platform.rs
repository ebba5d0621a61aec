use super::multi_reg::MultiReg;
use super::reset_synchronizer::ResetSynchronizer;
use crate::{Module, Signal};

/// A target platform, as seen by the primitives in this module.
///
/// A platform may provide its own implementation of [`MultiReg`] and [`ResetSynchronizer`], eg. to map them onto vendor synchronizer cells. When it does, elaboration delegates to the platform's factory instead of building the generic register chain. Primitives built on top of `MultiReg` pick up the override too.
///
/// All factories are optional, and default to `None`.
///
/// # Examples
///
/// ```
/// use sakai::cdc::*;
/// use sakai::*;
///
/// struct Vendor;
///
/// impl MultiRegFactory for Vendor {
///     fn build<'a>(
///         &self,
///         multi_reg: &MultiReg,
///         m: &'a Module<'a>,
///         i: &'a Signal<'a>,
///     ) -> &'a Signal<'a> {
///         let sync = m.cell("sync", "VENDOR_SYNC");
///         sync.param("STAGES", multi_reg.n().to_string());
///         sync.clock("CLK", multi_reg.odomain());
///         sync.drive_input("D", i);
///         sync.output("Q", multi_reg.width())
///     }
/// }
///
/// impl Platform for Vendor {
///     fn multi_reg_factory(&self) -> Option<&dyn MultiRegFactory> {
///         Some(self)
///     }
/// }
///
/// let c = Context::new();
///
/// let multi_reg = MultiReg::new(MultiRegConfig::default()).unwrap();
/// let ports = multi_reg.elaborate(&c, "mreg", &Vendor);
///
/// assert!(ports.module.registers().is_empty());
/// assert_eq!(ports.module.cells()[0].kind(), "VENDOR_SYNC");
/// ```
pub trait Platform {
    /// The platform's own [`MultiReg`] implementation, if it has one.
    fn multi_reg_factory(&self) -> Option<&dyn MultiRegFactory> {
        None
    }

    /// The platform's own [`ResetSynchronizer`] implementation, if it has one.
    fn reset_synchronizer_factory(&self) -> Option<&dyn ResetSynchronizerFactory> {
        None
    }
}

/// Builds a platform-specific [`MultiReg`].
pub trait MultiRegFactory {
    /// Builds the synchronizer for `multi_reg` inside `m`, whose input is `i`, and returns the signal that drives the output.
    ///
    /// The returned signal must belong to `m` and be `multi_reg.width()` bits wide.
    fn build<'a>(&self, multi_reg: &MultiReg, m: &'a Module<'a>, i: &'a Signal<'a>)
        -> &'a Signal<'a>;
}

/// Builds a platform-specific [`ResetSynchronizer`].
pub trait ResetSynchronizerFactory {
    /// Builds the synchronizer for `reset_synchronizer` inside `m`, whose asynchronous reset input is `arst`.
    ///
    /// The factory is responsible for driving the reset of `reset_synchronizer.domain()` with [`Module::drive_reset`].
    fn build<'a>(
        &self,
        reset_synchronizer: &ResetSynchronizer,
        m: &'a Module<'a>,
        arst: &'a Signal<'a>,
    );
}

/// A platform with no specialized primitives; everything is built from generic registers.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericPlatform;

impl Platform for GenericPlatform {}
