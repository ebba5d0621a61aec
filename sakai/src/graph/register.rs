use super::constant::*;
use super::module::*;
use super::signal::*;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ptr;

/// The attribute that marks a register as a synchronizer stage which synthesis tools must not retime, duplicate, or merge.
pub const NO_RETIMING: &str = "no_retiming";

/// A hardware register, created by [`Module::reg`].
///
/// A register is clocked by the clock domain named when it was created, and is reset to its [default value](Self::default_value) while that domain's reset is asserted, unless it's [reset-less](Self::reset_less).
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
/// let my_reg = m.reg("my_reg", 32, "sync");
/// my_reg.default_value(0xfadebabeu32);
/// my_reg.drive_next(!my_reg.value);
/// m.output("my_output", my_reg.value);
/// ```
#[must_use]
pub struct Register<'a> {
    pub(crate) data: &'a RegisterData<'a>,

    /// This register's current value.
    pub value: &'a Signal<'a>,
}

pub(crate) struct RegisterData<'a> {
    pub module: &'a Module<'a>,

    pub name: String,
    pub bit_width: u32,
    pub domain: String,
    pub initial_value: RefCell<Option<Constant>>,
    pub reset_less: RefCell<bool>,
    pub attrs: RefCell<BTreeMap<String, String>>,
    pub next: RefCell<Option<&'a Signal<'a>>>,
}

impl<'a> Register<'a> {
    /// Specifies the default (reset) value for this `Register`.
    ///
    /// If no default value is specified, the register resets to `0`.
    ///
    /// # Panics
    ///
    /// Panics if this `Register` already has a default value specified, or if the specified `value` doesn't fit into this `Register`'s bit width.
    pub fn default_value<C: Into<Constant>>(&'a self, value: C) {
        if self.data.initial_value.borrow().is_some() {
            panic!("Attempted to specify a default value for register \"{}\" in module \"{}\", but this register already has a default value.", self.data.name, self.data.module.name);
        }
        let value: Constant = value.into();
        if !value.fits(self.data.bit_width) {
            panic!("Cannot fit the specified value '{}' into register \"{}\"'s bit width '{}'. The value '{}' requires a bit width of at least {} bit(s).", value.value(), self.data.name, self.data.bit_width, value.value(), value.required_bits());
        }
        *self.data.initial_value.borrow_mut() = Some(value);
    }

    /// Specifies whether or not this `Register` ignores its clock domain's reset.
    pub fn reset_less(&'a self, reset_less: bool) {
        *self.data.reset_less.borrow_mut() = reset_less;
    }

    /// Attaches a named attribute to this `Register`, replacing any previous value of the same attribute.
    pub fn attr<K: Into<String>, V: Into<String>>(&'a self, key: K, value: V) {
        self.data
            .attrs
            .borrow_mut()
            .insert(key.into(), value.into());
    }

    /// Marks this `Register` with the [`NO_RETIMING`] attribute.
    pub fn no_retiming(&'a self) {
        self.attr(NO_RETIMING, "true");
    }

    /// Specifies the value this `Register` takes on the next edge of its clock.
    ///
    /// A register that's never driven keeps its value.
    ///
    /// # Panics
    ///
    /// Panics if `n` belongs to another module, if its bit width doesn't match this `Register`'s, or if this `Register` is already driven.
    pub fn drive_next(&'a self, n: &'a Signal<'a>) {
        if !ptr::eq(self.data.module, n.module()) {
            panic!(
                "Attempted to drive register \"{}\" in module \"{}\" with a signal from another module.",
                self.data.name, self.data.module.name
            );
        }
        if n.bit_width() != self.data.bit_width {
            panic!("Attempted to drive register \"{}\" in module \"{}\" with a {}-bit signal, but the register is {} bit(s) wide.", self.data.name, self.data.module.name, n.bit_width(), self.data.bit_width);
        }
        let mut next = self.data.next.borrow_mut();
        if next.is_some() {
            panic!(
                "Attempted to drive register \"{}\" in module \"{}\", but this register is already driven.",
                self.data.name, self.data.module.name
            );
        }
        *next = Some(n);
    }

    /// The name of this `Register`.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// The name of the clock domain this `Register` is clocked by.
    pub fn domain(&self) -> &str {
        &self.data.domain
    }

    /// The bit width of this `Register`.
    pub fn bit_width(&self) -> u32 {
        self.data.bit_width
    }

    /// The value this `Register` takes on reset.
    pub fn reset_value(&self) -> u128 {
        self.data
            .initial_value
            .borrow()
            .map_or(0, Constant::value)
    }

    /// Whether or not this `Register` ignores its clock domain's reset.
    pub fn is_reset_less(&self) -> bool {
        *self.data.reset_less.borrow()
    }

    /// Returns the value of the attribute `key`, if this `Register` has it.
    pub fn get_attr(&self, key: &str) -> Option<String> {
        self.data.attrs.borrow().get(key).cloned()
    }

    /// Whether or not this `Register` carries the [`NO_RETIMING`] attribute.
    pub fn is_no_retiming(&self) -> bool {
        self.data.attrs.borrow().contains_key(NO_RETIMING)
    }

    /// The [`Signal`] this `Register` is driven by, if any.
    pub fn next(&self) -> Option<&'a Signal<'a>> {
        *self.data.next.borrow()
    }
}
