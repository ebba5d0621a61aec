use super::module::*;
use super::signal::*;

use std::cell::RefCell;
use std::ptr;

/// An input of a [`Module`], created by [`Module::input`].
///
/// `value` is the [`Signal`] seen inside the module. When the module is a child of another module, the input must be driven from the parent with [`drive`](Self::drive).
///
/// # Examples
///
/// ```
/// use sakai::*;
///
/// let c = Context::new();
///
/// let top = c.module("top", "Top");
/// let child = top.module("child", "Child");
///
/// let child_i = child.input("i", 8);
/// child.output("o", !child_i.value);
///
/// child_i.drive(top.input("i", 8).value);
/// ```
#[must_use]
pub struct Input<'a> {
    pub(crate) data: &'a InputData<'a>,

    /// This input's value, as a [`Signal`] inside its module.
    pub value: &'a Signal<'a>,
}

pub(crate) struct InputData<'a> {
    pub module: &'a Module<'a>,

    pub name: String,
    pub bit_width: u32,
    pub driven_value: RefCell<Option<&'a Signal<'a>>>,
}

impl<'a> Input<'a> {
    /// The name of this input.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// The bit width of this input.
    pub fn bit_width(&self) -> u32 {
        self.data.bit_width
    }

    /// Drives this input with `i`, a [`Signal`] from this input's parent module.
    ///
    /// # Panics
    ///
    /// Panics if this input belongs to a top-level module, if `i` doesn't belong to the parent module, if the bit widths don't match, or if this input is already driven.
    pub fn drive(&'a self, i: &'a Signal<'a>) {
        let module = self.data.module;
        let parent = match module.parent {
            Some(parent) => parent,
            None => panic!(
                "Attempted to drive input \"{}\" of top-level module \"{}\". Inputs can only be driven from a parent module.",
                self.data.name, module.name
            ),
        };
        if !ptr::eq(parent, i.module) {
            panic!(
                "Attempted to drive input \"{}\" of module \"{}\" with a signal that doesn't belong to its parent module \"{}\".",
                self.data.name, module.name, parent.name
            );
        }
        if i.bit_width() != self.data.bit_width {
            panic!(
                "Attempted to drive input \"{}\" of module \"{}\" with a {}-bit signal, but the input is {} bit(s) wide.",
                self.data.name,
                module.name,
                i.bit_width(),
                self.data.bit_width
            );
        }
        let mut driven_value = self.data.driven_value.borrow_mut();
        if driven_value.is_some() {
            panic!(
                "Attempted to drive input \"{}\" of module \"{}\", but this input is already driven.",
                self.data.name, module.name
            );
        }
        *driven_value = Some(i);
    }

    /// Returns the [`Signal`] driving this input from the parent module, if any.
    pub fn driven_value(&self) -> Option<&'a Signal<'a>> {
        *self.data.driven_value.borrow()
    }
}

/// An output of a [`Module`], created by [`Module::output`].
#[must_use]
pub struct Output<'a> {
    pub(crate) data: &'a OutputData<'a>,
}

pub(crate) struct OutputData<'a> {
    pub module: &'a Module<'a>,

    pub name: String,
    pub source: &'a Signal<'a>,
}

impl<'a> Output<'a> {
    /// The name of this output.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// The bit width of this output.
    pub fn bit_width(&self) -> u32 {
        self.data.source.bit_width()
    }

    /// The [`Signal`] driving this output inside its module.
    pub fn source(&self) -> &'a Signal<'a> {
        self.data.source
    }

    /// Creates a [`Signal`] in this output's parent module that represents the output's value.
    ///
    /// # Panics
    ///
    /// Panics if this output belongs to a top-level module.
    ///
    /// # Examples
    ///
    /// ```
    /// use sakai::*;
    ///
    /// let c = Context::new();
    ///
    /// let top = c.module("top", "Top");
    /// let child = top.module("child", "Child");
    /// let child_o = child.output("o", child.high());
    ///
    /// top.output("o", child_o.value());
    /// ```
    pub fn value(&'a self) -> &'a Signal<'a> {
        let module = self.data.module;
        let parent = match module.parent {
            Some(parent) => parent,
            None => panic!(
                "Attempted to take the value of output \"{}\" of top-level module \"{}\". Outputs can only be observed from a parent module.",
                self.data.name, module.name
            ),
        };
        module.context.signal_arena.alloc(Signal {
            context: module.context,
            module: parent,

            data: SignalData::Output { data: self.data },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    #[should_panic(
        expected = "Attempted to drive input \"i\" of top-level module \"A\". Inputs can only be driven from a parent module."
    )]
    fn drive_top_level_input_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let i = m.input("i", 1);

        // Panic
        i.drive(m.high());
    }

    #[test]
    #[should_panic(
        expected = "Attempted to drive input \"i\" of module \"Child\" with a signal that doesn't belong to its parent module \"Top\"."
    )]
    fn drive_from_child_error() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let i = child.input("i", 1);

        // Panic
        i.drive(child.high());
    }

    #[test]
    #[should_panic(
        expected = "Attempted to drive input \"i\" of module \"Child\" with a 2-bit signal, but the input is 1 bit(s) wide."
    )]
    fn drive_bit_width_error() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let i = child.input("i", 1);

        // Panic
        i.drive(top.lit(0u32, 2));
    }

    #[test]
    #[should_panic(
        expected = "Attempted to drive input \"i\" of module \"Child\", but this input is already driven."
    )]
    fn drive_twice_error() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let i = child.input("i", 1);
        i.drive(top.high());

        // Panic
        i.drive(top.low());
    }

    #[test]
    #[should_panic(
        expected = "Attempted to take the value of output \"o\" of top-level module \"A\". Outputs can only be observed from a parent module."
    )]
    fn top_level_output_value_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let o = m.output("o", m.high());

        // Panic
        let _ = o.value();
    }

    #[test]
    fn output_value_belongs_to_parent() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let o = child.output("o", child.lit(0u32, 5));

        let v = o.value();
        assert!(std::ptr::eq(v.module(), top));
        assert_eq!(v.bit_width(), 5);
    }
}
