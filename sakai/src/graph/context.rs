use super::cell::*;
use super::domain::*;
use super::mem::*;
use super::module::*;
use super::port::*;
use super::register::*;
use super::signal::*;

use typed_arena::Arena;

use std::cell::RefCell;

/// Something that can own [`Module`]s: either a [`Context`] (for top-level modules) or another [`Module`] (for child modules).
///
/// Generators in [`cdc`](crate::cdc) accept any `ModuleParent`, so the same primitive can be elaborated on its own or inside a larger design.
pub trait ModuleParent<'a> {
    /// Creates a new [`Module`] called `instance_name` in this parent, whose definition is called `name`.
    ///
    /// Conventionally, `name` should be `CamelCase`, though this is not enforced.
    ///
    /// # Panics
    ///
    /// Panics if a [`Module`] with the same `instance_name` already exists in this parent.
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
    /// ```
    ///
    /// The following example panics by reusing an instance name:
    ///
    /// ```should_panic
    /// use sakai::*;
    ///
    /// let c = Context::new();
    ///
    /// let _ = c.module("a", "A"); // Unique name, OK
    /// let _ = c.module("a", "A"); // Non-unique name, panic!
    /// ```
    fn module(&'a self, instance_name: impl Into<String>, name: impl Into<String>)
        -> &'a Module<'a>;
}

/// A top-level container/owner object for a [`Module`] graph.
///
/// A `Context` owns all parts of a module graph, and provides an API for creating top-level [`Module`] objects.
///
/// # Examples
///
/// ```
/// use sakai::*;
///
/// let c = Context::new();
///
/// let m = c.module("m", "MyModule");
/// m.output("out", m.input("in", 1).value);
/// ```
#[must_use]
pub struct Context<'a> {
    pub(super) module_arena: Arena<Module<'a>>,
    pub(super) input_data_arena: Arena<InputData<'a>>,
    pub(super) input_arena: Arena<Input<'a>>,
    pub(super) output_data_arena: Arena<OutputData<'a>>,
    pub(super) output_arena: Arena<Output<'a>>,
    pub(super) signal_arena: Arena<Signal<'a>>,
    pub(super) register_data_arena: Arena<RegisterData<'a>>,
    pub(super) register_arena: Arena<Register<'a>>,
    pub(super) mem_arena: Arena<Mem<'a>>,
    pub(super) domain_arena: Arena<ClockDomain<'a>>,
    pub(super) cell_arena: Arena<Cell<'a>>,

    pub(crate) modules: RefCell<Vec<&'a Module<'a>>>,
}

impl<'a> Context<'a> {
    /// Creates a new, empty `Context`.
    pub fn new() -> Context<'a> {
        Context {
            module_arena: Arena::new(),
            input_data_arena: Arena::new(),
            input_arena: Arena::new(),
            output_data_arena: Arena::new(),
            output_arena: Arena::new(),
            signal_arena: Arena::new(),
            register_data_arena: Arena::new(),
            register_arena: Arena::new(),
            mem_arena: Arena::new(),
            domain_arena: Arena::new(),
            cell_arena: Arena::new(),

            modules: RefCell::new(Vec::new()),
        }
    }

    /// Returns the top-level [`Module`]s created in this `Context`, in creation order.
    pub fn modules(&self) -> Vec<&'a Module<'a>> {
        self.modules.borrow().clone()
    }
}

impl<'a> Default for Context<'a> {
    fn default() -> Self {
        Context::new()
    }
}

impl<'a> ModuleParent<'a> for Context<'a> {
    fn module(
        &'a self,
        instance_name: impl Into<String>,
        name: impl Into<String>,
    ) -> &'a Module<'a> {
        let instance_name = instance_name.into();
        if self
            .modules
            .borrow()
            .iter()
            .any(|m| m.instance_name == instance_name)
        {
            panic!(
                "A top-level module with the instance name \"{}\" already exists in this context.",
                instance_name
            );
        }
        let module = self
            .module_arena
            .alloc(Module::new(self, None, instance_name, name.into()));
        self.modules.borrow_mut().push(module);
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_no_modules() {
        let c = Context::new();

        assert!(c.modules().is_empty());
    }

    #[test]
    fn modules_in_creation_order() {
        let c = Context::new();

        let _ = c.module("b", "B");
        let _ = c.module("a", "A");

        let names: Vec<_> = c.modules().iter().map(|m| m.instance_name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    #[should_panic(
        expected = "A top-level module with the instance name \"a\" already exists in this context."
    )]
    fn duplicate_instance_name_error() {
        let c = Context::new();

        let _ = c.module("a", "A");

        // Panic
        let _ = c.module("a", "B");
    }
}
