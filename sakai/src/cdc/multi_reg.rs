use super::error::*;
use super::{default_domain, Platform, Ports};
use crate::{Module, ModuleParent, Signal};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for a [`MultiReg`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiRegConfig {
    /// Bit width of the resynchronized signal.
    pub width: u32,
    /// Name of the output clock domain.
    pub odomain: String,
    /// Number of synchronization stages.
    pub n: u32,
    /// Reset value of every stage.
    pub reset: u128,
    /// Whether the stages ignore `odomain`'s reset.
    pub reset_less: bool,
}

impl Default for MultiRegConfig {
    fn default() -> Self {
        MultiRegConfig {
            width: 1,
            odomain: default_domain(),
            n: 2,
            reset: 0,
            reset_less: true,
        }
    }
}

/// Resynchronizes a signal to a different clock domain.
///
/// Consists of a chain of `n` flip-flops clocked by `odomain`, each marked [`NO_RETIMING`](crate::NO_RETIMING). Eliminates metastability at the output, but provides no other guarantee as to the safe domain-crossing of a signal: bits of a multi-bit input may arrive in different cycles. Use a [`BusSynchronizer`](super::BusSynchronizer) for words that must move together.
///
/// The chain is reset-less by default. Resetting a synchronizer while it's sampling reopens the metastability window it exists to close, so only clear `reset_less` when the output must hold `reset` until `odomain`'s reset is released.
///
/// A [`Platform`] with a [`MultiRegFactory`](super::MultiRegFactory) builds the chain instead.
///
/// # Examples
///
/// ```
/// use sakai::cdc::*;
/// use sakai::*;
///
/// let c = Context::new();
///
/// let top = c.module("top", "Top");
/// let multi_reg = MultiReg::new(MultiRegConfig {
///     width: 8,
///     odomain: "fast".into(),
///     ..Default::default()
/// })
/// .unwrap();
///
/// let ports = multi_reg.elaborate(top, "mreg", &GenericPlatform);
/// ports.i.drive(top.input("i", 8).value);
/// top.output("o", ports.o.value());
///
/// assert_eq!(ports.module.registers().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct MultiReg {
    pub(super) config: MultiRegConfig,
}

impl MultiReg {
    /// Validates `config` and creates a `MultiReg`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `width` or `n` is `0`, `width` exceeds the maximum signal width, `odomain` is empty, or `reset` doesn't fit in `width` bits.
    pub fn new(config: MultiRegConfig) -> Result<MultiReg, ConfigError> {
        check_width("width", config.width)?;
        check_positive("n", config.n)?;
        check_domain("odomain", &config.odomain)?;
        if 128 - config.reset.leading_zeros() > config.width {
            return Err(ConfigError::ResetOutOfRange {
                value: config.reset,
                width: config.width,
            });
        }
        Ok(MultiReg { config })
    }

    /// The configuration this `MultiReg` was created with.
    pub fn config(&self) -> &MultiRegConfig {
        &self.config
    }

    /// Bit width of the resynchronized signal.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Name of the output clock domain.
    pub fn odomain(&self) -> &str {
        &self.config.odomain
    }

    /// Number of synchronization stages.
    pub fn n(&self) -> u32 {
        self.config.n
    }

    /// Reset value of every stage.
    pub fn reset(&self) -> u128 {
        self.config.reset
    }

    /// Whether the stages ignore `odomain`'s reset.
    pub fn reset_less(&self) -> bool {
        self.config.reset_less
    }

    /// Elaborates this `MultiReg` into a new child module of `parent` called `instance_name`.
    ///
    /// The returned [`Ports`] have an input `i` and an output `o`, both `width` bits wide.
    pub fn elaborate<'a, P: ModuleParent<'a>>(
        &self,
        parent: &'a P,
        instance_name: &str,
        platform: &dyn Platform,
    ) -> Ports<'a> {
        let m = parent.module(instance_name, "MultiReg");
        let i = m.input("i", self.config.width);

        let o = match platform.multi_reg_factory() {
            Some(factory) => {
                debug!("Delegating MultiReg {} to the platform", m.path());
                factory.build(self, m, i.value)
            }
            None => {
                debug!(
                    "Elaborating MultiReg {} with {} stage(s) in {}",
                    m.path(),
                    self.config.n,
                    self.config.odomain
                );
                self.build_chain(m, i.value)
            }
        };
        let o = m.output("o", o);

        Ports { module: m, i, o }
    }

    fn build_chain<'a>(&self, m: &'a Module<'a>, i: &'a Signal<'a>) -> &'a Signal<'a> {
        (0..self.config.n).fold(i, |prev, index| {
            let stage = m.reg(
                format!("cdc{}", index),
                self.config.width,
                &self.config.odomain,
            );
            stage.default_value(self.config.reset);
            stage.reset_less(self.config.reset_less);
            stage.no_retiming();
            stage.drive_next(prev);
            stage.value
        })
    }
}
