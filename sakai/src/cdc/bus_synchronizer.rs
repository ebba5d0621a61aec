use super::error::*;
use super::{
    bits_for, default_domain, MultiReg, MultiRegConfig, Platform, Ports, PulseSynchronizer,
    PulseSynchronizerConfig,
};
use crate::{sakai_sugar, ModuleParent};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for a [`BusSynchronizer`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSynchronizerConfig {
    /// Bit width of the bus.
    pub width: u32,
    /// Name of the input clock domain.
    pub idomain: String,
    /// Name of the output clock domain.
    pub odomain: String,
    /// Number of synchronization stages in the request/acknowledge pulse synchronizers. Must be at least 2.
    pub sync_stages: u32,
    /// Number of input cycles without an acknowledgement after which the request is re-sent. `0` disables the watchdog.
    pub timeout: u32,
}

impl Default for BusSynchronizerConfig {
    fn default() -> Self {
        BusSynchronizerConfig {
            width: 1,
            idomain: default_domain(),
            odomain: default_domain(),
            sync_stages: 2,
            timeout: 127,
        }
    }
}

/// Passes a multi-bit signal from one clock domain to another, keeping its bits together.
///
/// Every word observed at `o` was present at `i` as a whole in some `idomain` cycle, unlike with a plain [`MultiReg`].
///
/// The transfer is a request/acknowledge handshake:
///
/// 1. `idomain` raises a request at start-up, after every acknowledgement, and when the watchdog expires.
/// 2. The request crosses into `odomain` through a [`PulseSynchronizer`] with `sync_stages + 1` stages. The extra stage keeps the request from overtaking the data it announces.
/// 3. The request latches the resynchronized data word into the output register.
/// 4. The request is echoed back into `idomain` through a second `PulseSynchronizer` as an acknowledgement, which samples `i` into the holding buffer for the next transfer.
///
/// When `timeout` isn't `0`, a countdown in `idomain` re-sends the request after `timeout` cycles without an acknowledgement, eg. when the output clock stopped while a request was in flight.
///
/// A transfer takes around `2 * sync_stages` cycles of the slower clock. `o` only changes when a transfer completes, so changes of `i` faster than that are merged and only the latest value is carried.
///
/// A 1-bit `BusSynchronizer` is just a [`MultiReg`] of `sync_stages` stages.
///
/// # Examples
///
/// ```
/// use sakai::cdc::*;
/// use sakai::*;
///
/// let c = Context::new();
///
/// let bus_sync = BusSynchronizer::new(BusSynchronizerConfig {
///     width: 16,
///     idomain: "cpu".into(),
///     odomain: "pix".into(),
///     ..Default::default()
/// })
/// .unwrap();
///
/// let ports = bus_sync.elaborate(&c, "bus_sync", &GenericPlatform);
/// assert_eq!(ports.o.bit_width(), 16);
/// ```
#[derive(Clone, Debug)]
pub struct BusSynchronizer {
    config: BusSynchronizerConfig,
}

impl BusSynchronizer {
    /// Validates `config` and creates a `BusSynchronizer`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `width` is `0` or exceeds the maximum signal width, if `sync_stages` is less than 2, or if either domain is empty.
    pub fn new(config: BusSynchronizerConfig) -> Result<BusSynchronizer, ConfigError> {
        check_width("width", config.width)?;
        check_greater_than("sync_stages", 1, config.sync_stages)?;
        check_domain("idomain", &config.idomain)?;
        check_domain("odomain", &config.odomain)?;
        Ok(BusSynchronizer { config })
    }

    /// The configuration this `BusSynchronizer` was created with.
    pub fn config(&self) -> &BusSynchronizerConfig {
        &self.config
    }

    /// Elaborates this `BusSynchronizer` into a new child module of `parent` called `instance_name`.
    ///
    /// The returned [`Ports`] have an input `i` and an output `o`, both `width` bits wide.
    pub fn elaborate<'a, P: ModuleParent<'a>>(
        &self,
        parent: &'a P,
        instance_name: &str,
        platform: &dyn Platform,
    ) -> Ports<'a> {
        let config = &self.config;
        let m = parent.module(instance_name, "BusSynchronizer");
        let i = m.input("i", config.width);

        if config.width == 1 {
            debug!(
                "Elaborating 1-bit BusSynchronizer {} as a MultiReg",
                m.path()
            );
            let mreg = MultiReg {
                config: MultiRegConfig {
                    width: 1,
                    odomain: config.odomain.clone(),
                    n: config.sync_stages,
                    ..Default::default()
                },
            };
            let mreg = mreg.elaborate(m, "mreg", platform);
            mreg.i.drive(i.value);
            let o = m.output("o", mreg.o.value());
            return Ports { module: m, i, o };
        }

        debug!(
            "Elaborating BusSynchronizer {} from {} to {} with timeout {}",
            m.path(),
            config.idomain,
            config.odomain,
            config.timeout
        );

        let sync_io = PulseSynchronizer {
            config: PulseSynchronizerConfig {
                idomain: config.idomain.clone(),
                odomain: config.odomain.clone(),
                sync_stages: config.sync_stages + 1,
            },
        };
        let sync_io = sync_io.elaborate(m, "sync_io", platform);
        let sync_oi = PulseSynchronizer {
            config: PulseSynchronizerConfig {
                idomain: config.odomain.clone(),
                odomain: config.idomain.clone(),
                sync_stages: config.sync_stages,
            },
        };
        let sync_oi = sync_oi.elaborate(m, "sync_oi", platform);

        let ack_o = sync_io.o.value();
        sync_oi.i.drive(ack_o);
        let ack_i = sync_oi.o.value();

        let start = m.reg("start", 1, &config.idomain);
        start.default_value(true);
        start.drive_next(m.low());

        let mut req = start.value | ack_i;
        if config.timeout != 0 {
            let bit_width = bits_for(config.timeout);
            let zero = m.lit(0u32, bit_width);

            let countdown = m.reg("countdown", bit_width, &config.idomain);
            countdown.default_value(config.timeout);
            req = req | countdown.value.eq(zero);

            let mut next = countdown.value;
            sakai_sugar! {
                if (countdown.value.ne(zero)) {
                    next = countdown.value - m.lit(1u32, bit_width);
                }
                if (ack_i | req) {
                    next = m.lit(config.timeout, bit_width);
                }
            }
            countdown.drive_next(next);
        }
        sync_io.i.drive(req);

        let buf_i = m.reg("buf_i", config.width, &config.idomain);
        buf_i.no_retiming();
        buf_i.drive_next(ack_i.mux(i.value, buf_i.value));

        let sync_data = MultiReg {
            config: MultiRegConfig {
                width: config.width,
                odomain: config.odomain.clone(),
                n: config.sync_stages,
                ..Default::default()
            },
        };
        let sync_data = sync_data.elaborate(m, "sync_data", platform);
        sync_data.i.drive(buf_i.value);
        let buf_o = sync_data.o.value();

        let o = m.reg("o", config.width, &config.odomain);
        o.no_retiming();
        o.drive_next(ack_o.mux(buf_o, o.value));
        let o = m.output("o", o.value);

        Ports { module: m, i, o }
    }
}
