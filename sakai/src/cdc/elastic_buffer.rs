use super::error::*;
use super::{bits_for, default_domain, incr, Platform, Ports};
use crate::ModuleParent;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for an [`ElasticBuffer`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticBufferConfig {
    /// Bit width of the stream.
    pub width: u32,
    /// Number of words in the buffer. Must be at least 2.
    pub depth: u32,
    /// Name of the input (write) clock domain.
    pub idomain: String,
    /// Name of the output (read) clock domain.
    pub odomain: String,
}

impl Default for ElasticBufferConfig {
    fn default() -> Self {
        ElasticBufferConfig {
            width: 1,
            depth: 4,
            idomain: default_domain(),
            odomain: default_domain(),
        }
    }
}

/// Passes a continuous stream between two clock domains of the same frequency.
///
/// Words are written to a dual-port memory of `depth` words in `idomain` and read back from it in `odomain`. The write pointer resets to `depth / 2` and the read pointer to `0`, so the two ends may drift up to `depth / 2` words apart in either direction. Both pointers advance on every cycle of their own clock, so `o` follows `i` with a constant latency.
///
/// There is no flow control. The two clocks must have the same frequency and differ only in phase and jitter; a sustained frequency difference overruns or underruns the buffer and corrupts the stream.
///
/// # Examples
///
/// ```
/// use sakai::cdc::*;
/// use sakai::*;
///
/// let c = Context::new();
///
/// let elastic_buffer = ElasticBuffer::new(ElasticBufferConfig {
///     width: 10,
///     depth: 8,
///     idomain: "rx".into(),
///     odomain: "sys".into(),
/// })
/// .unwrap();
///
/// let ports = elastic_buffer.elaborate(&c, "elastic_buffer", &GenericPlatform);
/// assert_eq!(ports.module.mems()[0].address_bit_width(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct ElasticBuffer {
    config: ElasticBufferConfig,
}

impl ElasticBuffer {
    /// Validates `config` and creates an `ElasticBuffer`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `width` is `0` or exceeds the maximum signal width, if `depth` is less than 2, or if either domain is empty.
    pub fn new(config: ElasticBufferConfig) -> Result<ElasticBuffer, ConfigError> {
        check_width("width", config.width)?;
        check_greater_than("depth", 1, config.depth)?;
        check_domain("idomain", &config.idomain)?;
        check_domain("odomain", &config.odomain)?;
        Ok(ElasticBuffer { config })
    }

    /// The configuration this `ElasticBuffer` was created with.
    pub fn config(&self) -> &ElasticBufferConfig {
        &self.config
    }

    /// Elaborates this `ElasticBuffer` into a new child module of `parent` called `instance_name`.
    ///
    /// The returned [`Ports`] have an input `i` and an output `o`, both `width` bits wide.
    pub fn elaborate<'a, P: ModuleParent<'a>>(
        &self,
        parent: &'a P,
        instance_name: &str,
        _platform: &dyn Platform,
    ) -> Ports<'a> {
        let config = &self.config;
        let m = parent.module(instance_name, "ElasticBuffer");
        debug!(
            "Elaborating ElasticBuffer {} with {} word(s) from {} to {}",
            m.path(),
            config.depth,
            config.idomain,
            config.odomain
        );
        let i = m.input("i", config.width);

        let address_bit_width = bits_for(config.depth - 1);

        let wptr = m.reg("wptr", address_bit_width, &config.idomain);
        wptr.default_value(config.depth / 2);
        wptr.drive_next(incr(m, wptr.value, config.depth));

        let rptr = m.reg("rptr", address_bit_width, &config.odomain);
        rptr.default_value(0u32);
        rptr.drive_next(incr(m, rptr.value, config.depth));

        let storage = m.mem("storage", address_bit_width, config.width);
        storage.write_port(&config.idomain, wptr.value, i.value, m.high());
        let o = m.output("o", storage.read_port(&config.odomain, rptr.value, m.high()));

        Ports { module: m, i, o }
    }
}
