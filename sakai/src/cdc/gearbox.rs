use super::error::*;
use super::{bits_for, default_domain, incr, Platform, Ports};
use crate::{ModuleParent, Register, Signal};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for a [`Gearbox`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearboxConfig {
    /// Bit width of the input.
    pub iwidth: u32,
    /// Name of the input clock domain.
    pub idomain: String,
    /// Bit width of the output.
    pub owidth: u32,
    /// Name of the output clock domain.
    pub odomain: String,
}

impl Default for GearboxConfig {
    fn default() -> Self {
        GearboxConfig {
            iwidth: 1,
            idomain: default_domain(),
            owidth: 1,
            odomain: default_domain(),
        }
    }
}

/// Adapts the width of a continuous stream.
///
/// The input is `iwidth` bits wide at some clock frequency `f`; the output is `owidth` bits wide at `iwidth / owidth * f`. This is the usual glue between system logic and a SerDes.
///
/// The stream passes through a circular storage buffer of [`storage_size`](Self::storage_size) bits: the least common multiple of the two widths, doubled until it holds at least 4 input chunks and 4 output chunks. The input side writes one `iwidth` chunk per input cycle and the output side reads one `owidth` chunk per output cycle. Each pointer wraps around its own number of chunks. The pointer with more chunks to step through starts halfway around the buffer, so the two sides start as far apart as possible.
///
/// The two clocks must be derived from the same reference, so that the pointers keep their distance. Unrelated clocks drift, and the stream is corrupted when the pointers meet.
///
/// # Examples
///
/// ```
/// use sakai::cdc::*;
/// use sakai::*;
///
/// let gearbox = Gearbox::new(GearboxConfig {
///     iwidth: 8,
///     idomain: "sys".into(),
///     owidth: 2,
///     odomain: "serdes".into(),
/// })
/// .unwrap();
///
/// assert_eq!(gearbox.storage_size(), 32);
/// assert_eq!(gearbox.input_chunks(), 4);
/// assert_eq!(gearbox.output_chunks(), 16);
///
/// let c = Context::new();
/// let ports = gearbox.elaborate(&c, "gearbox", &GenericPlatform);
/// assert_eq!(ports.i.bit_width(), 8);
/// assert_eq!(ports.o.bit_width(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Gearbox {
    config: GearboxConfig,
    storage_size: u32,
}

impl Gearbox {
    /// Validates `config` and creates a `Gearbox`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `iwidth` or `owidth` is `0` or exceeds the maximum signal width, or if either domain is empty.
    pub fn new(config: GearboxConfig) -> Result<Gearbox, ConfigError> {
        check_width("iwidth", config.iwidth)?;
        check_width("owidth", config.owidth)?;
        check_domain("idomain", &config.idomain)?;
        check_domain("odomain", &config.odomain)?;

        let mut storage_size = config.iwidth / gcd(config.iwidth, config.owidth) * config.owidth;
        while storage_size / config.iwidth < 4 {
            storage_size *= 2;
        }
        while storage_size / config.owidth < 4 {
            storage_size *= 2;
        }

        Ok(Gearbox {
            config,
            storage_size,
        })
    }

    /// The configuration this `Gearbox` was created with.
    pub fn config(&self) -> &GearboxConfig {
        &self.config
    }

    /// The size of the storage buffer, in bits.
    pub fn storage_size(&self) -> u32 {
        self.storage_size
    }

    /// The number of input chunks the storage buffer holds.
    pub fn input_chunks(&self) -> u32 {
        self.storage_size / self.config.iwidth
    }

    /// The number of output chunks the storage buffer holds.
    pub fn output_chunks(&self) -> u32 {
        self.storage_size / self.config.owidth
    }

    /// Elaborates this `Gearbox` into a new child module of `parent` called `instance_name`.
    ///
    /// The returned [`Ports`] have an `iwidth`-bit input `i` and an `owidth`-bit output `o`.
    pub fn elaborate<'a, P: ModuleParent<'a>>(
        &self,
        parent: &'a P,
        instance_name: &str,
        _platform: &dyn Platform,
    ) -> Ports<'a> {
        let config = &self.config;
        let ichunks = self.input_chunks();
        let ochunks = self.output_chunks();

        let m = parent.module(instance_name, "Gearbox");
        debug!(
            "Elaborating Gearbox {} with {} bit(s) of storage ({} input chunk(s), {} output chunk(s))",
            m.path(),
            self.storage_size,
            ichunks,
            ochunks
        );
        let i = m.input("i", config.iwidth);

        let i_faster = ichunks > ochunks;

        let iptr = m.reg("iptr", bits_for(ichunks - 1), &config.idomain);
        iptr.default_value(if i_faster { ichunks / 2 } else { 0 });
        iptr.drive_next(incr(m, iptr.value, ichunks));

        let optr = m.reg("optr", bits_for(ochunks - 1), &config.odomain);
        optr.default_value(if i_faster { 0 } else { ochunks / 2 });
        optr.drive_next(incr(m, optr.value, ochunks));

        // One register per input chunk, so the storage isn't bound by the maximum signal width
        let storage = (0..ichunks)
            .map(|index| {
                let chunk = m.reg(format!("storage{}", index), config.iwidth, &config.idomain);
                chunk.no_retiming();
                let selected = iptr.value.eq(m.lit(index, iptr.bit_width()));
                chunk.drive_next(selected.mux(i.value, chunk.value));
                chunk
            })
            .collect::<Vec<_>>();

        let cases = (0..ochunks)
            .map(|index| storage_slice(&storage, config.iwidth, index * config.owidth, config.owidth))
            .collect::<Vec<_>>();

        let o = m.reg("o", config.owidth, &config.odomain);
        o.drive_next(m.switch(optr.value, &cases));
        let o = m.output("o", o.value);

        Ports { module: m, i, o }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// The `bit_width` storage bits starting at `low`, gathered from the chunk registers that hold them.
fn storage_slice<'a>(
    storage: &[&'a Register<'a>],
    chunk_width: u32,
    low: u32,
    bit_width: u32,
) -> &'a Signal<'a> {
    let high = low + bit_width;
    let piece = |pos: u32| {
        let offset = pos % chunk_width;
        let len = (chunk_width - offset).min(high - pos);
        let chunk = storage[(pos / chunk_width) as usize];
        (chunk.value.bits(offset + len - 1, offset), len)
    };

    let (mut slice, mut pos) = {
        let (first, len) = piece(low);
        (first, low + len)
    };
    while pos < high {
        let (upper, len) = piece(pos);
        slice = upper.concat(slice);
        pos += len;
    }
    slice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdc::*;
    use crate::*;

    #[test]
    fn config_errors() {
        assert_eq!(
            Gearbox::new(GearboxConfig {
                iwidth: 0,
                owidth: 2,
                ..Default::default()
            })
            .unwrap_err()
            .to_string(),
            "iwidth must be a positive integer, not 0"
        );
        assert_eq!(
            Gearbox::new(GearboxConfig {
                iwidth: 8,
                owidth: 0,
                ..Default::default()
            })
            .unwrap_err(),
            ConfigError::NotPositive {
                param: "owidth",
                value: 0
            }
        );
    }

    #[test]
    fn storage_sizes() {
        let size = |iwidth, owidth| {
            Gearbox::new(GearboxConfig {
                iwidth,
                owidth,
                ..Default::default()
            })
            .unwrap()
            .storage_size()
        };

        assert_eq!(size(8, 2), 32);
        assert_eq!(size(2, 8), 32);
        assert_eq!(size(10, 20), 80);
        assert_eq!(size(20, 10), 80);
        assert_eq!(size(3, 5), 30);
        assert_eq!(size(1, 1), 4);
        assert_eq!(size(128, 64), 512);

        for (iwidth, owidth) in [(8, 2), (3, 5), (7, 7), (66, 64), (128, 1)] {
            let gearbox = Gearbox::new(GearboxConfig {
                iwidth,
                owidth,
                ..Default::default()
            })
            .unwrap();
            assert!(gearbox.input_chunks() >= 4);
            assert!(gearbox.output_chunks() >= 4);
            assert_eq!(gearbox.input_chunks() * iwidth, gearbox.storage_size());
            assert_eq!(gearbox.output_chunks() * owidth, gearbox.storage_size());
        }
    }

    #[test]
    fn pointer_structure() {
        let c = Context::new();

        let gearbox = Gearbox::new(GearboxConfig {
            iwidth: 8,
            idomain: "i".into(),
            owidth: 2,
            odomain: "o".into(),
        })
        .unwrap();
        let ports = gearbox.elaborate(&c, "gearbox", &GenericPlatform);
        let registers = ports.module.registers();

        let iptr = registers[0];
        assert_eq!(iptr.name(), "iptr");
        assert_eq!(iptr.bit_width(), 2);
        assert_eq!(iptr.reset_value(), 0);
        let optr = registers[1];
        assert_eq!(optr.name(), "optr");
        assert_eq!(optr.bit_width(), 4);
        assert_eq!(optr.reset_value(), 8);

        let storage = registers
            .iter()
            .filter(|register| register.name().starts_with("storage"))
            .collect::<Vec<_>>();
        assert_eq!(storage.len(), 4);
        assert!(storage
            .iter()
            .all(|chunk| chunk.is_no_retiming() && chunk.domain() == "i"));
    }

    #[test]
    fn faster_input_starts_at_midpoint() {
        let c = Context::new();

        let gearbox = Gearbox::new(GearboxConfig {
            iwidth: 2,
            owidth: 8,
            ..Default::default()
        })
        .unwrap();
        let ports = gearbox.elaborate(&c, "gearbox", &GenericPlatform);
        let registers = ports.module.registers();

        assert_eq!(registers[0].reset_value(), 8);
        assert_eq!(registers[1].reset_value(), 0);
    }

    #[test]
    fn slices_span_chunks() {
        let c = Context::new();

        let m = c.module("a", "A");
        let storage = (0..4)
            .map(|index| m.reg(format!("storage{}", index), 3, "sync"))
            .collect::<Vec<_>>();

        assert_eq!(storage_slice(&storage, 3, 0, 3).bit_width(), 3);
        assert_eq!(storage_slice(&storage, 3, 2, 5).bit_width(), 5);
        assert_eq!(storage_slice(&storage, 3, 1, 10).bit_width(), 10);
    }
}
