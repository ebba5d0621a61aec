use super::cell::*;
use super::constant::*;
use super::context::*;
use super::domain::*;
use super::mem::*;
use super::port::*;
use super::register::*;
use super::signal::*;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ptr;

/// A self-contained hardware design unit, created by [`ModuleParent::module`] on a [`Context`] (top-level) or on another `Module` (child).
///
/// A `Module` owns the inputs, outputs, registers, memories, clock domain declarations, platform cells, and child modules described inside it.
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
pub struct Module<'a> {
    pub(super) context: &'a Context<'a>,

    pub(crate) parent: Option<&'a Module<'a>>,

    pub(crate) instance_name: String,
    pub(crate) name: String,

    pub(crate) inputs: RefCell<BTreeMap<String, &'a Input<'a>>>,
    pub(crate) outputs: RefCell<BTreeMap<String, &'a Output<'a>>>,
    pub(crate) registers: RefCell<Vec<&'a Register<'a>>>,
    pub(crate) modules: RefCell<Vec<&'a Module<'a>>>,
    pub(crate) mems: RefCell<Vec<&'a Mem<'a>>>,
    pub(crate) domains: RefCell<BTreeMap<String, &'a ClockDomain<'a>>>,
    pub(crate) reset_drivers: RefCell<BTreeMap<String, &'a Signal<'a>>>,
    pub(crate) cells: RefCell<Vec<&'a Cell<'a>>>,
}

impl<'a> Module<'a> {
    pub(super) fn new(
        context: &'a Context<'a>,
        parent: Option<&'a Module<'a>>,
        instance_name: String,
        name: String,
    ) -> Module<'a> {
        Module {
            context,

            parent,

            instance_name,
            name,

            inputs: RefCell::new(BTreeMap::new()),
            outputs: RefCell::new(BTreeMap::new()),
            registers: RefCell::new(Vec::new()),
            modules: RefCell::new(Vec::new()),
            mems: RefCell::new(Vec::new()),
            domains: RefCell::new(BTreeMap::new()),
            reset_drivers: RefCell::new(BTreeMap::new()),
            cells: RefCell::new(Vec::new()),
        }
    }

    /// The name of this module's definition, eg. `"MultiReg"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of this particular module instance within its parent.
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// The module containing this one, or `None` for a top-level module.
    pub fn parent(&self) -> Option<&'a Module<'a>> {
        self.parent
    }

    /// The registers described directly in this module, in creation order.
    pub fn registers(&self) -> Vec<&'a Register<'a>> {
        self.registers.borrow().clone()
    }

    /// The child modules of this module, in creation order.
    pub fn modules(&self) -> Vec<&'a Module<'a>> {
        self.modules.borrow().clone()
    }

    /// The memories described directly in this module.
    pub fn mems(&self) -> Vec<&'a Mem<'a>> {
        self.mems.borrow().clone()
    }

    /// The platform cells instantiated directly in this module.
    pub fn cells(&self) -> Vec<&'a Cell<'a>> {
        self.cells.borrow().clone()
    }

    /// The clock domains declared locally in this module.
    pub fn domains(&self) -> Vec<&'a ClockDomain<'a>> {
        self.domains.borrow().values().copied().collect()
    }

    /// The signal driving the reset of `domain` from this module, if any.
    pub fn reset_driver(&self, domain: &str) -> Option<&'a Signal<'a>> {
        self.reset_drivers.borrow().get(domain).copied()
    }

    /// Looks up an input of this module by name.
    pub fn find_input(&self, name: &str) -> Option<&'a Input<'a>> {
        self.inputs.borrow().get(name).copied()
    }

    /// Looks up an output of this module by name.
    pub fn find_output(&self, name: &str) -> Option<&'a Output<'a>> {
        self.outputs.borrow().get(name).copied()
    }

    /// Returns the dotted instance path of this module, eg. `"top.sync_io.mreg"`.
    pub fn path(&self) -> String {
        match self.parent {
            Some(parent) => format!("{}.{}", parent.path(), self.instance_name),
            None => self.instance_name.clone(),
        }
    }

    /// Creates a [`Signal`] that represents the constant literal specified by `value` with `bit_width` bits.
    ///
    /// The bit width of the type provided by `value` doesn't need to match `bit_width`, but the value represented by `value` must fit into `bit_width` bits.
    ///
    /// # Panics
    ///
    /// Panics if `bit_width` is less than [`MIN_SIGNAL_BIT_WIDTH`] or greater than [`MAX_SIGNAL_BIT_WIDTH`], respectively, or if the specified `value` doesn't fit into `bit_width` bits.
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
    /// let eight_bit_const = m.lit(0xffu32, 8);
    /// let one_bit_const = m.lit(0u32, 1);
    /// let twenty_seven_bit_const = m.lit(true, 27);
    /// ```
    pub fn lit<C: Into<Constant>>(&'a self, value: C, bit_width: u32) -> &'a Signal<'a> {
        if bit_width < MIN_SIGNAL_BIT_WIDTH {
            panic!(
                "Cannot create a literal with {} bit(s). Signals must not be narrower than {} bit(s).",
                bit_width, MIN_SIGNAL_BIT_WIDTH
            );
        }
        if bit_width > MAX_SIGNAL_BIT_WIDTH {
            panic!(
                "Cannot create a literal with {} bit(s). Signals must not be wider than {} bit(s).",
                bit_width, MAX_SIGNAL_BIT_WIDTH
            );
        }
        let value: Constant = value.into();
        if !value.fits(bit_width) {
            panic!("Cannot fit the specified value '{}' into the specified bit width '{}'. The value '{}' requires a bit width of at least {} bit(s).", value.value(), bit_width, value.value(), value.required_bits());
        }
        self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self,

            data: SignalData::Lit { value, bit_width },
        })
    }

    /// Convenience method to create a [`Signal`] that represents a single `0` bit.
    pub fn low(&'a self) -> &'a Signal<'a> {
        self.lit(false, 1)
    }

    /// Convenience method to create a [`Signal`] that represents a single `1` bit.
    pub fn high(&'a self) -> &'a Signal<'a> {
        self.lit(true, 1)
    }

    /// Creates an input for this `Module` called `name` with `bit_width` bits.
    ///
    /// The returned [`Input`]'s `value` is the [`Signal`] seen inside this module. Inputs of child modules must be driven from the parent with [`Input::drive`]; inputs of top-level modules are driven by whoever consumes the graph.
    ///
    /// # Panics
    ///
    /// Panics if `bit_width` is less than [`MIN_SIGNAL_BIT_WIDTH`] or greater than [`MAX_SIGNAL_BIT_WIDTH`], respectively, or if an input with the same `name` already exists.
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
    /// let my_input = m.input("my_input", 80);
    /// assert_eq!(my_input.value.bit_width(), 80);
    /// ```
    pub fn input<S: Into<String>>(&'a self, name: S, bit_width: u32) -> &'a Input<'a> {
        let name = name.into();
        if bit_width < MIN_SIGNAL_BIT_WIDTH {
            panic!(
                "Cannot create an input with {} bit(s). Signals must not be narrower than {} bit(s).",
                bit_width, MIN_SIGNAL_BIT_WIDTH
            );
        }
        if bit_width > MAX_SIGNAL_BIT_WIDTH {
            panic!(
                "Cannot create an input with {} bit(s). Signals must not be wider than {} bit(s).",
                bit_width, MAX_SIGNAL_BIT_WIDTH
            );
        }
        if self.inputs.borrow().contains_key(&name) {
            panic!(
                "An input called \"{}\" already exists in module \"{}\".",
                name, self.name
            );
        }
        let data = self.context.input_data_arena.alloc(InputData {
            module: self,
            name: name.clone(),
            bit_width,
            driven_value: RefCell::new(None),
        });
        let value = self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self,

            data: SignalData::Input { data },
        });
        let input = self.context.input_arena.alloc(Input { data, value });
        self.inputs.borrow_mut().insert(name, input);
        input
    }

    /// Creates an output for this `Module` called `name` with the same number of bits as `source`, and drives this output with `source`.
    ///
    /// # Panics
    ///
    /// Panics if `source` doesn't belong to this `Module`, or if an output with the same `name` already exists.
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
    /// let some_signal = m.high();
    /// m.output("my_output", some_signal);
    /// ```
    pub fn output<S: Into<String>>(&'a self, name: S, source: &'a Signal<'a>) -> &'a Output<'a> {
        let name = name.into();
        if !ptr::eq(self, source.module) {
            panic!("Cannot output a signal from another module.");
        }
        if self.outputs.borrow().contains_key(&name) {
            panic!(
                "An output called \"{}\" already exists in module \"{}\".",
                name, self.name
            );
        }
        let data = self.context.output_data_arena.alloc(OutputData {
            module: self,
            name: name.clone(),
            source,
        });
        let output = self.context.output_arena.alloc(Output { data });
        self.outputs.borrow_mut().insert(name, output);
        output
    }

    /// Creates a [`Register`] in this `Module` called `name` with `bit_width` bits, clocked by the clock domain called `domain`.
    ///
    /// `domain` is resolved by name: to the nearest enclosing [`clock_domain`](Self::clock_domain) declaration, or else to a top-level domain of that name.
    ///
    /// # Panics
    ///
    /// Panics if `bit_width` is out of range, or if `domain` is empty.
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
    pub fn reg<S: Into<String>>(&'a self, name: S, bit_width: u32, domain: &str) -> &'a Register<'a> {
        let name = name.into();
        if bit_width < MIN_SIGNAL_BIT_WIDTH {
            panic!(
                "Cannot create a register with {} bit(s). Signals must not be narrower than {} bit(s).",
                bit_width, MIN_SIGNAL_BIT_WIDTH
            );
        }
        if bit_width > MAX_SIGNAL_BIT_WIDTH {
            panic!(
                "Cannot create a register with {} bit(s). Signals must not be wider than {} bit(s).",
                bit_width, MAX_SIGNAL_BIT_WIDTH
            );
        }
        if domain.is_empty() {
            panic!(
                "Cannot create register \"{}\" in module \"{}\" without a clock domain.",
                name, self.name
            );
        }
        let data = self.context.register_data_arena.alloc(RegisterData {
            module: self,
            name,
            bit_width,
            domain: domain.to_string(),
            initial_value: RefCell::new(None),
            reset_less: RefCell::new(false),
            attrs: RefCell::new(BTreeMap::new()),
            next: RefCell::new(None),
        });
        let value = self.context.signal_arena.alloc(Signal {
            context: self.context,
            module: self,

            data: SignalData::Reg { data },
        });
        let register = self.context.register_arena.alloc(Register { data, value });
        self.registers.borrow_mut().push(register);
        register
    }

    /// Creates a [`Mem`] in this `Module` called `name` with `address_bit_width` address bits and `element_bit_width` element bits.
    ///
    /// # Panics
    ///
    /// Panics if either bit width is out of range.
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
    /// let my_mem = m.mem("my_mem", 2, 8);
    /// my_mem.write_port("sync", m.lit(0u32, 2), m.lit(0xa5u32, 8), m.high());
    /// m.output("data", my_mem.read_port("sync", m.lit(0u32, 2), m.high()));
    /// ```
    pub fn mem<S: Into<String>>(
        &'a self,
        name: S,
        address_bit_width: u32,
        element_bit_width: u32,
    ) -> &'a Mem<'a> {
        let name = name.into();
        if address_bit_width < MIN_SIGNAL_BIT_WIDTH || address_bit_width > MAX_SIGNAL_BIT_WIDTH {
            panic!("Cannot create a memory with {} address bit(s). Signals must be between {} and {} bit(s) wide.", address_bit_width, MIN_SIGNAL_BIT_WIDTH, MAX_SIGNAL_BIT_WIDTH);
        }
        if element_bit_width < MIN_SIGNAL_BIT_WIDTH || element_bit_width > MAX_SIGNAL_BIT_WIDTH {
            panic!("Cannot create a memory with {} element bit(s). Signals must be between {} and {} bit(s) wide.", element_bit_width, MIN_SIGNAL_BIT_WIDTH, MAX_SIGNAL_BIT_WIDTH);
        }
        let mem = self.context.mem_arena.alloc(Mem {
            context: self.context,
            module: self,

            name,
            address_bit_width,
            element_bit_width,

            initial_contents: RefCell::new(None),

            read_ports: RefCell::new(Vec::new()),
            write_port: RefCell::new(None),
        });
        self.mems.borrow_mut().push(mem);
        mem
    }

    /// Creates a [`Signal`] that selects `cases[selector]`, built as a tree of multiplexers with one level per selector bit.
    ///
    /// Selector values at or beyond `cases.len()` select the last case.
    ///
    /// # Panics
    ///
    /// Panics if `cases` is empty, if `selector` belongs to a different module, or if `selector` can't address every case. Cases that can't be multiplexed together panic as in [`Signal::mux`].
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
    /// let sel = m.input("sel", 2);
    /// let cases = [m.lit(1u32, 8), m.lit(2u32, 8), m.lit(4u32, 8)];
    /// m.output("o", m.switch(sel.value, &cases));
    /// ```
    pub fn switch(&'a self, selector: &'a Signal<'a>, cases: &[&'a Signal<'a>]) -> &'a Signal<'a> {
        let last = match cases.last() {
            Some(last) => *last,
            None => panic!("Cannot switch over an empty list of cases."),
        };
        if !ptr::eq(self, selector.module) {
            panic!("Attempted to combine signals from different modules.");
        }
        let selector_bit_width = selector.bit_width();
        if selector_bit_width < 128 && (cases.len() as u128) > (1u128 << selector_bit_width) {
            panic!(
                "Cannot switch over {} cases with a {}-bit selector.",
                cases.len(),
                selector_bit_width
            );
        }

        // Each level halves the candidates using one selector bit, padding odd levels with `last`
        let mut level = cases.to_vec();
        let mut bit = 0;
        while level.len() > 1 {
            let sel = selector.bit(bit);
            level = level
                .chunks(2)
                .map(|pair| {
                    let low = pair[0];
                    let high = pair.get(1).copied().unwrap_or(last);
                    if ptr::eq(low, high) {
                        low
                    } else {
                        sel.mux(high, low)
                    }
                })
                .collect();
            bit += 1;
        }
        let selected = level[0];

        if bit < selector_bit_width && !ptr::eq(selected, last) {
            let upper = selector.bits(selector_bit_width - 1, bit);
            upper
                .ne(self.lit(0u32, upper.bit_width()))
                .mux(last, selected)
        } else {
            selected
        }
    }

    /// Instantiates a platform-native primitive called `instance_name` of type `kind` in this `Module`.
    ///
    /// Cells are opaque to this crate: their ports are connected by name, and they're passed through to whatever consumes the graph.
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
    /// ```
    pub fn cell<S: Into<String>, K: Into<String>>(&'a self, instance_name: S, kind: K) -> &'a Cell<'a> {
        let instance_name = instance_name.into();
        if self
            .cells
            .borrow()
            .iter()
            .any(|cell| cell.instance_name == instance_name)
        {
            panic!(
                "A cell with the instance name \"{}\" already exists in module \"{}\".",
                instance_name, self.name
            );
        }
        let cell = self.context.cell_arena.alloc(Cell {
            context: self.context,
            module: self,

            instance_name,
            kind: kind.into(),
            params: RefCell::new(BTreeMap::new()),
            clocks: RefCell::new(BTreeMap::new()),
            inputs: RefCell::new(BTreeMap::new()),
            outputs: RefCell::new(BTreeMap::new()),
        });
        self.cells.borrow_mut().push(cell);
        cell
    }

    /// Declares a clock domain called `name`, local to this module and its children, whose clock is the clock of the domain `clock_from`.
    ///
    /// `clock_from` is resolved from the scope enclosing this module. When `async_reset` is set, the domain's reset takes effect immediately rather than on the next clock edge. The domain's reset is low unless driven with [`drive_reset`](Self::drive_reset).
    ///
    /// # Panics
    ///
    /// Panics if `name` or `clock_from` is empty, or if a domain called `name` is already declared in this module.
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
    /// m.clock_domain("local", "sync", true);
    /// m.drive_reset("local", m.input("arst", 1).value);
    /// ```
    pub fn clock_domain<S: Into<String>>(&'a self, name: S, clock_from: &str, async_reset: bool) {
        let name = name.into();
        if name.is_empty() || clock_from.is_empty() {
            panic!("Clock domain names must not be empty.");
        }
        if self.domains.borrow().contains_key(&name) {
            panic!(
                "A clock domain called \"{}\" is already declared in module \"{}\".",
                name, self.name
            );
        }
        let domain = self.context.domain_arena.alloc(ClockDomain {
            module: self,
            name: name.clone(),
            clock_from: clock_from.to_string(),
            async_reset,
        });
        self.domains.borrow_mut().insert(name, domain);
    }

    /// Drives the reset of the clock domain called `domain` with `reset`.
    ///
    /// `domain` is resolved from this module, so this can drive either a locally-declared domain or a top-level one.
    ///
    /// # Panics
    ///
    /// Panics if `reset` belongs to another module, if it isn't 1 bit wide, or if this module already drives the reset of `domain`.
    pub fn drive_reset(&'a self, domain: &str, reset: &'a Signal<'a>) {
        if !ptr::eq(self, reset.module) {
            panic!("Cannot drive a reset with a signal from another module.");
        }
        if reset.bit_width() != 1 {
            panic!(
                "Cannot drive the reset of domain \"{}\" with a {}-bit signal. Resets must be 1 bit wide.",
                domain,
                reset.bit_width()
            );
        }
        let mut reset_drivers = self.reset_drivers.borrow_mut();
        if reset_drivers.contains_key(domain) {
            panic!(
                "The reset of domain \"{}\" is already driven in module \"{}\".",
                domain, self.name
            );
        }
        reset_drivers.insert(domain.to_string(), reset);
    }
}

impl<'a> ModuleParent<'a> for Module<'a> {
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
                "A module with the instance name \"{}\" already exists in module \"{}\".",
                instance_name, self.name
            );
        }
        let module = self.context.module_arena.alloc(Module::new(
            self.context,
            Some(self),
            instance_name,
            name.into(),
        ));
        self.modules.borrow_mut().push(module);
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(
        expected = "Cannot create a literal with 0 bit(s). Signals must not be narrower than 1 bit(s)."
    )]
    fn lit_bit_width_lt_min_error() {
        let c = Context::new();

        let m = c.module("a", "A");

        // Panic
        let _ = m.lit(false, 0);
    }

    #[test]
    #[should_panic(
        expected = "Cannot create a literal with 129 bit(s). Signals must not be wider than 128 bit(s)."
    )]
    fn lit_bit_width_gt_max_error() {
        let c = Context::new();

        let m = c.module("a", "A");

        // Panic
        let _ = m.lit(false, 129);
    }

    #[test]
    #[should_panic(
        expected = "Cannot fit the specified value '128' into the specified bit width '7'. The value '128' requires a bit width of at least 8 bit(s)."
    )]
    fn lit_value_cannot_fit_bit_width_error() {
        let c = Context::new();

        let m = c.module("a", "A");

        // Panic
        let _ = m.lit(128u32, 7);
    }

    #[test]
    #[should_panic(expected = "An input called \"i\" already exists in module \"A\".")]
    fn input_duplicate_name_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let _ = m.input("i", 1);

        // Panic
        let _ = m.input("i", 2);
    }

    #[test]
    #[should_panic(
        expected = "Cannot create an input with 129 bit(s). Signals must not be wider than 128 bit(s)."
    )]
    fn input_width_gt_max_error() {
        let c = Context::new();

        let m = c.module("a", "A");

        // Panic
        let _ = m.input("i", 129);
    }

    #[test]
    #[should_panic(expected = "Cannot output a signal from another module.")]
    fn output_separate_module_error() {
        let c = Context::new();

        let m1 = c.module("a", "A");

        let m2 = c.module("b", "B");
        let i = m2.high();

        // Panic
        m1.output("a", i);
    }

    #[test]
    #[should_panic(
        expected = "Cannot create register \"r\" in module \"A\" without a clock domain."
    )]
    fn reg_without_domain_error() {
        let c = Context::new();

        let m = c.module("a", "A");

        // Panic
        let _ = m.reg("r", 1, "");
    }

    #[test]
    fn child_module_paths() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let grandchild = child.module("grandchild", "Grandchild");

        assert_eq!(grandchild.path(), "top.child.grandchild");
        assert!(ptr::eq(grandchild.parent().unwrap(), child));
        assert_eq!(top.modules().len(), 1);
        assert!(top.parent().is_none());
    }

    #[test]
    #[should_panic(
        expected = "A module with the instance name \"child\" already exists in module \"Top\"."
    )]
    fn child_module_duplicate_instance_name_error() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let _ = top.module("child", "Child");

        // Panic
        let _ = top.module("child", "Child");
    }

    #[test]
    fn switch_cases() {
        let c = Context::new();

        let m = c.module("a", "A");
        let sel = m.input("sel", 2);
        let cases = [m.lit(1u32, 8), m.lit(2u32, 8), m.lit(4u32, 8)];

        let selected = m.switch(sel.value, &cases);
        assert_eq!(selected.bit_width(), 8);

        // A single case needs no multiplexing at all
        assert!(ptr::eq(m.switch(sel.value, &cases[..1]), cases[0]));
    }

    fn mux_depth(signal: &Signal) -> u32 {
        match signal.data {
            SignalData::Mux {
                when_true,
                when_false,
                ..
            } => 1 + mux_depth(when_true).max(mux_depth(when_false)),
            _ => 0,
        }
    }

    #[test]
    fn switch_depth_is_logarithmic() {
        let c = Context::new();

        let m = c.module("a", "A");
        let sel = m.input("sel", 7);
        let cases = (0..128u32).map(|i| m.lit(i, 8)).collect::<Vec<_>>();
        assert_eq!(mux_depth(m.switch(sel.value, &cases)), 7);

        // Unused upper selector bits add a single clamping level
        let sel = m.input("wide_sel", 4);
        assert_eq!(mux_depth(m.switch(sel.value, &cases[..8])), 4);

        let sel = m.input("narrow_sel", 3);
        assert_eq!(mux_depth(m.switch(sel.value, &cases[..5])), 3);
    }

    #[test]
    #[should_panic(expected = "Cannot switch over 3 cases with a 1-bit selector.")]
    fn switch_selector_too_narrow_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let sel = m.input("sel", 1);
        let cases = [m.lit(1u32, 8), m.lit(2u32, 8), m.lit(4u32, 8)];

        // Panic
        let _ = m.switch(sel.value, &cases);
    }

    #[test]
    #[should_panic(expected = "Cannot switch over an empty list of cases.")]
    fn switch_empty_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        let sel = m.input("sel", 1);

        // Panic
        let _ = m.switch(sel.value, &[]);
    }

    #[test]
    #[should_panic(
        expected = "A clock domain called \"local\" is already declared in module \"A\"."
    )]
    fn clock_domain_duplicate_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        m.clock_domain("local", "sync", false);

        // Panic
        m.clock_domain("local", "sync", true);
    }

    #[test]
    #[should_panic(
        expected = "Cannot drive the reset of domain \"sync\" with a 2-bit signal. Resets must be 1 bit wide."
    )]
    fn drive_reset_bit_width_error() {
        let c = Context::new();

        let m = c.module("a", "A");

        // Panic
        m.drive_reset("sync", m.input("rst", 2).value);
    }

    #[test]
    #[should_panic(expected = "The reset of domain \"sync\" is already driven in module \"A\".")]
    fn drive_reset_twice_error() {
        let c = Context::new();

        let m = c.module("a", "A");
        m.drive_reset("sync", m.input("rst1", 1).value);

        // Panic
        m.drive_reset("sync", m.input("rst2", 1).value);
    }
}
