use super::error::*;
use super::{default_domain, MultiReg, MultiRegConfig, Platform, Ports};
use crate::ModuleParent;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for a [`PulseSynchronizer`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseSynchronizerConfig {
    /// Name of the input clock domain.
    pub idomain: String,
    /// Name of the output clock domain.
    pub odomain: String,
    /// Number of synchronization stages between the domains.
    pub sync_stages: u32,
}

impl Default for PulseSynchronizerConfig {
    fn default() -> Self {
        PulseSynchronizerConfig {
            idomain: default_domain(),
            odomain: default_domain(),
            sync_stages: 2,
        }
    }
}

/// Passes single-cycle pulses from one clock domain to another.
///
/// Every input pulse flips a toggle bit in `idomain`. The toggle crosses into `odomain` through a [`MultiReg`] of `sync_stages` stages, and a change in the resynchronized toggle produces one output pulse. Both `i` and `o` are 1 bit wide.
///
/// If the output clock is faster, input pulses may be asserted on every input cycle. If the input clock is faster by a ratio of n:1, input pulses must be at least n input cycles apart. Pulses closer together than that are merged or lost, which toggle encoding can't detect.
///
/// # Examples
///
/// ```
/// use sakai::cdc::*;
/// use sakai::*;
///
/// let c = Context::new();
///
/// let pulse_sync = PulseSynchronizer::new(PulseSynchronizerConfig {
///     idomain: "slow".into(),
///     odomain: "fast".into(),
///     ..Default::default()
/// })
/// .unwrap();
///
/// let ports = pulse_sync.elaborate(&c, "pulse_sync", &GenericPlatform);
/// assert_eq!(ports.module.modules()[0].name(), "MultiReg");
/// ```
#[derive(Clone, Debug)]
pub struct PulseSynchronizer {
    pub(super) config: PulseSynchronizerConfig,
}

impl PulseSynchronizer {
    /// Validates `config` and creates a `PulseSynchronizer`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `sync_stages` is `0` or either domain is empty.
    pub fn new(config: PulseSynchronizerConfig) -> Result<PulseSynchronizer, ConfigError> {
        check_positive("sync_stages", config.sync_stages)?;
        check_domain("idomain", &config.idomain)?;
        check_domain("odomain", &config.odomain)?;
        Ok(PulseSynchronizer { config })
    }

    /// The configuration this `PulseSynchronizer` was created with.
    pub fn config(&self) -> &PulseSynchronizerConfig {
        &self.config
    }

    /// Elaborates this `PulseSynchronizer` into a new child module of `parent` called `instance_name`.
    ///
    /// The returned [`Ports`] have a 1-bit input `i` and a 1-bit output `o`.
    pub fn elaborate<'a, P: ModuleParent<'a>>(
        &self,
        parent: &'a P,
        instance_name: &str,
        platform: &dyn Platform,
    ) -> Ports<'a> {
        let m = parent.module(instance_name, "PulseSynchronizer");
        debug!(
            "Elaborating PulseSynchronizer {} from {} to {}",
            m.path(),
            self.config.idomain,
            self.config.odomain
        );
        let i = m.input("i", 1);

        let itoggle = m.reg("itoggle", 1, &self.config.idomain);
        itoggle.drive_next(itoggle.value ^ i.value);

        let mreg = MultiReg {
            config: MultiRegConfig {
                width: 1,
                odomain: self.config.odomain.clone(),
                n: self.config.sync_stages,
                ..Default::default()
            },
        };
        let mreg = mreg.elaborate(m, "mreg", platform);
        mreg.i.drive(itoggle.value);
        let otoggle = mreg.o.value();

        let otoggle_prev = m.reg("otoggle_prev", 1, &self.config.odomain);
        otoggle_prev.drive_next(otoggle);

        let o = m.output("o", otoggle ^ otoggle_prev.value);

        Ports { module: m, i, o }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdc::*;
    use crate::*;

    #[test]
    fn sync_stages_zero_error() {
        let err = PulseSynchronizer::new(PulseSynchronizerConfig {
            sync_stages: 0,
            ..Default::default()
        })
        .unwrap_err();

        assert_eq!(
            err,
            ConfigError::NotPositive {
                param: "sync_stages",
                value: 0
            }
        );
    }

    #[test]
    fn toggle_structure() {
        let c = Context::new();

        let pulse_sync = PulseSynchronizer::new(PulseSynchronizerConfig {
            idomain: "a".into(),
            odomain: "b".into(),
            sync_stages: 3,
        })
        .unwrap();
        let ports = pulse_sync.elaborate(&c, "pulse_sync", &GenericPlatform);
        let m = ports.module;

        let registers = m.registers();
        assert_eq!(registers.len(), 2);
        assert_eq!(registers[0].name(), "itoggle");
        assert_eq!(registers[0].domain(), "a");
        assert_eq!(registers[1].name(), "otoggle_prev");
        assert_eq!(registers[1].domain(), "b");

        let children = m.modules();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].instance_name(), "mreg");
        let stages = children[0].registers();
        assert_eq!(stages.len(), 3);
        assert!(stages.iter().all(|stage| stage.domain() == "b"));
        assert!(std::ptr::eq(
            children[0].find_input("i").unwrap().driven_value().unwrap(),
            registers[0].value
        ));

        assert_eq!(ports.i.bit_width(), 1);
        assert_eq!(ports.o.bit_width(), 1);
    }
}
