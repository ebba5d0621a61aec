use super::error::*;
use super::{default_domain, Platform};
use crate::{Input, Module, ModuleParent, Signal};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The local clock domain a [`ResetSynchronizer`] clocks its chain with.
pub const RESET_SYNC_DOMAIN: &str = "_reset_sync";

/// Configuration for a [`ResetSynchronizer`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetSynchronizerConfig {
    /// Name of the domain whose reset is synchronized.
    pub domain: String,
    /// Number of synchronization stages.
    pub n: u32,
}

impl Default for ResetSynchronizerConfig {
    fn default() -> Self {
        ResetSynchronizerConfig {
            domain: default_domain(),
            n: 2,
        }
    }
}

/// The ports of an elaborated [`ResetSynchronizer`].
pub struct ResetSynchronizerPorts<'a> {
    /// The module the synchronizer was elaborated into.
    pub module: &'a Module<'a>,
    /// The asynchronous reset input, to be driven from the parent module.
    pub arst: &'a Input<'a>,
}

/// Synchronizes the deassertion of an asynchronous reset to a domain's clock.
///
/// Asserting `arst` asserts the reset of `domain` immediately, without waiting for its clock. Deasserting `arst` releases the reset of `domain` only after `n` edges of its clock.
///
/// The chain lives in a local domain, [`RESET_SYNC_DOMAIN`], which shares `domain`'s clock and is reset asynchronously by `arst`. Its `n` stages reset to `1` and shift in `0`, and the last stage drives the reset of `domain`.
///
/// A [`Platform`] with a [`ResetSynchronizerFactory`](super::ResetSynchronizerFactory) builds the chain instead.
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
/// let reset_sync = ResetSynchronizer::new(ResetSynchronizerConfig::default()).unwrap();
///
/// let ports = reset_sync.elaborate(top, "reset_sync", &GenericPlatform);
/// ports.arst.drive(top.input("arst", 1).value);
///
/// assert!(ports.module.reset_driver("sync").is_some());
/// ```
#[derive(Clone, Debug)]
pub struct ResetSynchronizer {
    config: ResetSynchronizerConfig,
}

impl ResetSynchronizer {
    /// Validates `config` and creates a `ResetSynchronizer`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `n` is `0`, or if `domain` is empty or is [`RESET_SYNC_DOMAIN`].
    pub fn new(config: ResetSynchronizerConfig) -> Result<ResetSynchronizer, ConfigError> {
        check_positive("n", config.n)?;
        check_domain("domain", &config.domain)?;
        if config.domain == RESET_SYNC_DOMAIN {
            return Err(ConfigError::ReservedDomain {
                param: "domain",
                value: config.domain,
            });
        }
        Ok(ResetSynchronizer { config })
    }

    /// The configuration this `ResetSynchronizer` was created with.
    pub fn config(&self) -> &ResetSynchronizerConfig {
        &self.config
    }

    /// Name of the domain whose reset is synchronized.
    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    /// Number of synchronization stages.
    pub fn n(&self) -> u32 {
        self.config.n
    }

    /// Elaborates this `ResetSynchronizer` into a new child module of `parent` called `instance_name`.
    pub fn elaborate<'a, P: ModuleParent<'a>>(
        &self,
        parent: &'a P,
        instance_name: &str,
        platform: &dyn Platform,
    ) -> ResetSynchronizerPorts<'a> {
        let m = parent.module(instance_name, "ResetSynchronizer");
        let arst = m.input("arst", 1);

        match platform.reset_synchronizer_factory() {
            Some(factory) => {
                debug!("Delegating ResetSynchronizer {} to the platform", m.path());
                factory.build(self, m, arst.value);
            }
            None => {
                debug!(
                    "Elaborating ResetSynchronizer {} with {} stage(s) for {}",
                    m.path(),
                    self.config.n,
                    self.config.domain
                );
                self.build_chain(m, arst.value);
            }
        }

        ResetSynchronizerPorts { module: m, arst }
    }

    fn build_chain<'a>(&self, m: &'a Module<'a>, arst: &'a Signal<'a>) {
        m.clock_domain(RESET_SYNC_DOMAIN, &self.config.domain, true);
        m.drive_reset(RESET_SYNC_DOMAIN, arst);

        let last = (0..self.config.n).fold(m.low(), |prev, index| {
            let stage = m.reg(format!("arst{}", index), 1, RESET_SYNC_DOMAIN);
            stage.default_value(true);
            stage.no_retiming();
            stage.drive_next(prev);
            stage.value
        });

        m.drive_reset(&self.config.domain, last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdc::*;
    use crate::*;

    #[test]
    fn n_zero_error() {
        let err = ResetSynchronizer::new(ResetSynchronizerConfig {
            n: 0,
            ..Default::default()
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "n must be a positive integer, not 0");
    }

    #[test]
    fn reserved_domain_error() {
        let err = ResetSynchronizer::new(ResetSynchronizerConfig {
            domain: RESET_SYNC_DOMAIN.into(),
            ..Default::default()
        })
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "domain must not be the reserved domain \"_reset_sync\""
        );
    }

    #[test]
    fn chain_structure() {
        let c = Context::new();

        let reset_sync = ResetSynchronizer::new(ResetSynchronizerConfig {
            domain: "pix".into(),
            n: 3,
        })
        .unwrap();
        let ports = reset_sync.elaborate(&c, "reset_sync", &GenericPlatform);
        let m = ports.module;

        let domains = m.domains();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].name(), RESET_SYNC_DOMAIN);
        assert_eq!(domains[0].clock_from(), "pix");
        assert!(domains[0].async_reset());
        assert_eq!(resolve_clock(m, RESET_SYNC_DOMAIN), "pix");

        assert!(std::ptr::eq(
            m.reset_driver(RESET_SYNC_DOMAIN).unwrap(),
            ports.arst.value
        ));

        let stages = m.registers();
        assert_eq!(stages.len(), 3);
        for (index, stage) in stages.iter().enumerate() {
            assert_eq!(stage.name(), format!("arst{}", index));
            assert_eq!(stage.domain(), RESET_SYNC_DOMAIN);
            assert_eq!(stage.reset_value(), 1);
            assert!(!stage.is_reset_less());
            assert!(stage.is_no_retiming());
        }
        assert!(std::ptr::eq(m.reset_driver("pix").unwrap(), stages[2].value));
    }

    struct VendorPlatform;

    impl ResetSynchronizerFactory for VendorPlatform {
        fn build<'a>(
            &self,
            reset_synchronizer: &ResetSynchronizer,
            m: &'a Module<'a>,
            arst: &'a Signal<'a>,
        ) {
            let sync = m.cell("sync", "VENDOR_RESET_SYNC");
            sync.param("STAGES", reset_synchronizer.n().to_string());
            sync.clock("CLK", reset_synchronizer.domain());
            sync.drive_input("ARST", arst);
            m.drive_reset(reset_synchronizer.domain(), sync.output("RST", 1));
        }
    }

    impl Platform for VendorPlatform {
        fn reset_synchronizer_factory(&self) -> Option<&dyn ResetSynchronizerFactory> {
            Some(self)
        }
    }

    #[test]
    fn platform_override() {
        let c = Context::new();

        let reset_sync = ResetSynchronizer::new(ResetSynchronizerConfig::default()).unwrap();
        let ports = reset_sync.elaborate(&c, "reset_sync", &VendorPlatform);
        let m = ports.module;

        assert!(m.registers().is_empty());
        assert!(m.domains().is_empty());
        assert_eq!(m.cells()[0].kind(), "VENDOR_RESET_SYNC");
        assert_eq!(m.cells()[0].get_param("STAGES").as_deref(), Some("2"));
        assert!(m.reset_driver("sync").is_some());
    }

    #[test]
    fn config_from_json() {
        let config: ResetSynchronizerConfig =
            serde_json::from_str(r#"{ "domain": "pix" }"#).unwrap();

        assert_eq!(
            config,
            ResetSynchronizerConfig {
                domain: "pix".into(),
                n: 2
            }
        );
    }
}
