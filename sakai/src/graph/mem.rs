use super::constant::*;
use super::context::*;
use super::module::*;
use super::signal::*;

use std::cell::RefCell;
use std::ptr;

/// A synchronous memory, created by [`Module::mem`].
///
/// Memories are always synchronous-read, synchronous-write. Each port is clocked by its own clock domain, so a memory with its write port in one domain and a read port in another is a safe way to move data between clock domains.
///
/// When a read and a write to the same location are clocked by the same edge, the read returns the previous value at that location, **not** the newly-written value.
///
/// Memories must have at least one read port specified, and either initial contents or a write port.
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
/// let my_mem = m.mem("my_mem", 1, 32);
/// // Optional, unless no write port is specified
/// my_mem.initial_contents(&[0xfadebabeu32, 0xdeadbeefu32]);
/// // Optional, unless no initial contents are specified
/// my_mem.write_port("write", m.high(), m.lit(0xabad1deau32, 32), m.high());
/// m.output("my_output", my_mem.read_port("read", m.high(), m.high()));
/// ```
#[must_use]
pub struct Mem<'a> {
    pub(super) context: &'a Context<'a>,
    pub(super) module: &'a Module<'a>,

    pub(crate) name: String,
    pub(crate) address_bit_width: u32,
    pub(crate) element_bit_width: u32,

    pub(crate) initial_contents: RefCell<Option<Vec<Constant>>>,

    pub(crate) read_ports: RefCell<Vec<&'a Signal<'a>>>,
    pub(crate) write_port: RefCell<Option<MemWritePort<'a>>>,
}

#[derive(Clone)]
pub(crate) struct MemWritePort<'a> {
    pub domain: String,
    pub address: &'a Signal<'a>,
    pub value: &'a Signal<'a>,
    pub enable: &'a Signal<'a>,
}

impl<'a> Mem<'a> {
    /// Specifies the initial contents for this `Mem`.
    ///
    /// # Panics
    ///
    /// Panics if this `Mem` already has initial contents specified, if `contents.len()` doesn't match the number of elements this `Mem` holds, or if any element doesn't fit into this `Mem`'s element bit width.
    pub fn initial_contents<C: Clone + Into<Constant>>(&'a self, contents: &[C]) {
        if self.initial_contents.borrow().is_some() {
            panic!("Attempted to specify initial contents for memory \"{}\" in module \"{}\", but this memory already has initial contents.", self.name, self.module.name);
        }
        let expected_contents_len = 1usize << self.address_bit_width;
        if contents.len() != expected_contents_len {
            panic!("Attempted to specify initial contents for memory \"{}\" in module \"{}\" that contains {} element(s), but this memory has {} address bit(s), and requires {} element(s).", self.name, self.module.name, contents.len(), self.address_bit_width, expected_contents_len);
        }
        *self.initial_contents.borrow_mut() = Some(contents.iter().cloned().enumerate().map(|(i, x)| {
            let ret: Constant = x.into();
            if !ret.fits(self.element_bit_width) {
                panic!("Attempted to specify initial contents for memory \"{}\" in module \"{}\", but this memory has an element width of {} bit(s), and these initial contents specify element {} with value {} which requires {} bit(s).", self.name, self.module.name, self.element_bit_width, i, ret.value(), ret.required_bits());
            }
            ret
        }).collect());
    }

    /// Specifies a read port for this `Mem`, clocked by `domain`, and returns a [`Signal`] representing the data read.
    ///
    /// The read data is registered: it reflects the contents at `address` as of the last edge of `domain`'s clock on which `enable` was high.
    ///
    /// # Panics
    ///
    /// Panics if `address`'s bit width doesn't match this `Mem`'s address bit width, or if `enable` isn't 1 bit wide.
    pub fn read_port(
        &'a self,
        domain: &str,
        address: &'a Signal<'a>,
        enable: &'a Signal<'a>,
    ) -> &'a Signal<'a> {
        if !ptr::eq(self.module, address.module()) || !ptr::eq(self.module, enable.module()) {
            panic!("Attempted to combine signals from different modules.");
        }
        if address.bit_width() != self.address_bit_width {
            panic!("Attempted to specify a read port for memory \"{}\" in module \"{}\" with an address signal with {} bit(s), but this memory has {} address bit(s).", self.name, self.module.name, address.bit_width(), self.address_bit_width);
        }
        if enable.bit_width() != 1 {
            panic!("Attempted to specify a read port for memory \"{}\" in module \"{}\" with an enable signal with {} bit(s), but memory read/write ports are required to be 1 bit wide.", self.name, self.module.name, enable.bit_width());
        }
        let ret = self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self.module,

            data: SignalData::MemReadPortOutput {
                mem: self,
                domain: domain.to_string(),
                address,
                enable,
            },
        });
        self.read_ports.borrow_mut().push(ret);
        ret
    }

    /// Specifies the write port for this `Mem`, clocked by `domain`.
    ///
    /// # Panics
    ///
    /// Panics if this `Mem` already has a write port, or if any of the signals' bit widths don't match this `Mem`.
    pub fn write_port(
        &'a self,
        domain: &str,
        address: &'a Signal<'a>,
        value: &'a Signal<'a>,
        enable: &'a Signal<'a>,
    ) {
        if self.write_port.borrow().is_some() {
            panic!("Attempted to specify a write port for memory \"{}\" in module \"{}\", but this memory already has a write port.", self.name, self.module.name);
        }
        if !ptr::eq(self.module, address.module())
            || !ptr::eq(self.module, value.module())
            || !ptr::eq(self.module, enable.module())
        {
            panic!("Attempted to combine signals from different modules.");
        }
        if address.bit_width() != self.address_bit_width {
            panic!("Attempted to specify a write port for memory \"{}\" in module \"{}\" with an address signal with {} bit(s), but this memory has {} address bit(s).", self.name, self.module.name, address.bit_width(), self.address_bit_width);
        }
        if value.bit_width() != self.element_bit_width {
            panic!("Attempted to specify a write port for memory \"{}\" in module \"{}\" with a value signal with {} bit(s), but this memory has {} element bit(s).", self.name, self.module.name, value.bit_width(), self.element_bit_width);
        }
        if enable.bit_width() != 1 {
            panic!("Attempted to specify a write port for memory \"{}\" in module \"{}\" with an enable signal with {} bit(s), but memory read/write ports are required to be 1 bit wide.", self.name, self.module.name, enable.bit_width());
        }
        *self.write_port.borrow_mut() = Some(MemWritePort {
            domain: domain.to_string(),
            address,
            value,
            enable,
        });
    }

    /// The name of this `Mem`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of address bits of this `Mem`.
    pub fn address_bit_width(&self) -> u32 {
        self.address_bit_width
    }

    /// The bit width of each element of this `Mem`.
    pub fn element_bit_width(&self) -> u32 {
        self.element_bit_width
    }

    /// The clock domain of this `Mem`'s write port, if it has one.
    pub fn write_domain(&self) -> Option<String> {
        self.write_port
            .borrow()
            .as_ref()
            .map(|port| port.domain.clone())
    }

    /// The clock domains of this `Mem`'s read ports, in creation order.
    pub fn read_domains(&self) -> Vec<String> {
        self.read_ports
            .borrow()
            .iter()
            .filter_map(|port| match &port.data {
                SignalData::MemReadPortOutput { domain, .. } => Some(domain.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    #[should_panic(
        expected = "Attempted to specify initial contents for memory \"mem\" in module \"A\", but this memory already has initial contents."
    )]
    fn initial_contents_already_specified_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let mem = m.mem("mem", 1, 1);

        mem.initial_contents(&[true, false]);

        // Panic
        mem.initial_contents(&[true, false]);
    }

    #[test]
    #[should_panic(
        expected = "Attempted to specify initial contents for memory \"mem\" in module \"A\" that contains 3 element(s), but this memory has 1 address bit(s), and requires 2 element(s)."
    )]
    fn initial_contents_length_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let mem = m.mem("mem", 1, 1);

        // Panic
        mem.initial_contents(&[true, false, true]);
    }

    #[test]
    #[should_panic(
        expected = "Attempted to specify a read port for memory \"mem\" in module \"A\" with an address signal with 2 bit(s), but this memory has 1 address bit(s)."
    )]
    fn read_port_address_bit_width_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let mem = m.mem("mem", 1, 1);

        // Panic
        let _ = mem.read_port("sync", m.lit(0u32, 2), m.high());
    }

    #[test]
    #[should_panic(
        expected = "Attempted to specify a write port for memory \"mem\" in module \"A\", but this memory already has a write port."
    )]
    fn write_port_already_specified_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let mem = m.mem("mem", 1, 32);

        mem.write_port("sync", m.low(), m.lit(0u32, 32), m.low());

        // Panic
        mem.write_port("sync", m.low(), m.lit(0u32, 32), m.low());
    }

    #[test]
    #[should_panic(
        expected = "Attempted to specify a write port for memory \"mem\" in module \"A\" with a value signal with 8 bit(s), but this memory has 32 element bit(s)."
    )]
    fn write_port_value_bit_width_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let mem = m.mem("mem", 1, 32);

        // Panic
        mem.write_port("sync", m.low(), m.lit(0u32, 8), m.low());
    }

    #[test]
    fn port_domains() {
        let c = Context::new();

        let m = c.module("a", "A");
        let mem = m.mem("mem", 2, 8);

        assert_eq!(mem.write_domain(), None);

        mem.write_port("write", m.lit(0u32, 2), m.lit(0u32, 8), m.high());
        let _ = mem.read_port("read", m.lit(0u32, 2), m.high());

        assert_eq!(mem.write_domain().as_deref(), Some("write"));
        assert_eq!(mem.read_domains(), vec!["read".to_string()]);
    }
}
