use super::context::*;
use super::module::*;
use super::signal::*;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ptr;

/// An instance of a platform-native primitive, created by [`Module::cell`].
///
/// Cells are black boxes: their parameters, clocks, and port connections are recorded by name and passed through to whatever consumes the graph. A [`Platform`](crate::cdc::Platform) uses cells to replace the generic implementation of a primitive with a vendor-specific one.
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
/// let ff = m.cell("ff", "FDRE");
/// ff.param("INIT", "1'b0");
/// ff.clock("C", "sync");
/// ff.drive_input("D", m.input("d", 1).value);
/// m.output("q", ff.output("Q", 1));
///
/// assert_eq!(ff.kind(), "FDRE");
/// assert_eq!(ff.get_param("INIT").as_deref(), Some("1'b0"));
/// ```
#[must_use]
pub struct Cell<'a> {
    pub(super) context: &'a Context<'a>,
    pub(super) module: &'a Module<'a>,

    pub(crate) instance_name: String,
    pub(crate) kind: String,
    pub(crate) params: RefCell<BTreeMap<String, String>>,
    pub(crate) clocks: RefCell<BTreeMap<String, String>>,
    pub(crate) inputs: RefCell<BTreeMap<String, &'a Signal<'a>>>,
    pub(crate) outputs: RefCell<BTreeMap<String, u32>>,
}

impl<'a> Cell<'a> {
    /// The instance name of this `Cell`.
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// The primitive type this `Cell` instantiates, eg. `"FDPE"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Sets the parameter `name` of this `Cell` to `value`.
    pub fn param<N: Into<String>, V: Into<String>>(&'a self, name: N, value: V) {
        self.params.borrow_mut().insert(name.into(), value.into());
    }

    /// Returns the value of the parameter `name`, if it's set.
    pub fn get_param(&self, name: &str) -> Option<String> {
        self.params.borrow().get(name).cloned()
    }

    /// Connects the clock port `port` of this `Cell` to the clock of the domain called `domain`.
    pub fn clock<P: Into<String>>(&'a self, port: P, domain: &str) {
        self.clocks
            .borrow_mut()
            .insert(port.into(), domain.to_string());
    }

    /// Returns the clock domain connected to the clock port `port`, if any.
    pub fn get_clock(&self, port: &str) -> Option<String> {
        self.clocks.borrow().get(port).cloned()
    }

    /// Connects the input port `port` of this `Cell` to `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` belongs to another module, or if `port` is already connected.
    pub fn drive_input<P: Into<String>>(&'a self, port: P, i: &'a Signal<'a>) {
        let port = port.into();
        if !ptr::eq(self.module, i.module()) {
            panic!(
                "Attempted to drive port \"{}\" of cell \"{}\" with a signal from another module.",
                port, self.instance_name
            );
        }
        let mut inputs = self.inputs.borrow_mut();
        if inputs.contains_key(&port) {
            panic!(
                "Attempted to drive port \"{}\" of cell \"{}\", but this port is already driven.",
                port, self.instance_name
            );
        }
        inputs.insert(port, i);
    }

    /// Returns the [`Signal`] connected to the input port `port`, if any.
    pub fn get_input(&self, port: &str) -> Option<&'a Signal<'a>> {
        self.inputs.borrow().get(port).copied()
    }

    /// Creates a [`Signal`] representing the output port `port` of this `Cell`, which is `bit_width` bits wide.
    ///
    /// # Panics
    ///
    /// Panics if `bit_width` is out of range, or if `port` was already taken with a different bit width.
    pub fn output<P: Into<String>>(&'a self, port: P, bit_width: u32) -> &'a Signal<'a> {
        let port = port.into();
        if !(MIN_SIGNAL_BIT_WIDTH..=MAX_SIGNAL_BIT_WIDTH).contains(&bit_width) {
            panic!(
                "Cannot take port \"{}\" of cell \"{}\" with {} bit(s). Signals must be between {} and {} bit(s) wide.",
                port, self.instance_name, bit_width, MIN_SIGNAL_BIT_WIDTH, MAX_SIGNAL_BIT_WIDTH
            );
        }
        let mut outputs = self.outputs.borrow_mut();
        if let Some(existing) = outputs.get(&port) {
            if *existing != bit_width {
                panic!(
                    "Port \"{}\" of cell \"{}\" was already taken with {} bit(s), but {} bit(s) were requested.",
                    port, self.instance_name, existing, bit_width
                );
            }
        }
        outputs.insert(port.clone(), bit_width);
        self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self.module,

            data: SignalData::CellOutput {
                cell: self,
                port,
                bit_width,
            },
        })
    }
}
