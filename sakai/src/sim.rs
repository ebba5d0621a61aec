//! Cycle-level reference simulation of an elaborated module hierarchy.
//!
//! The [`Simulator`] flattens a hierarchy into a list of combinational nodes and steps it one clock edge at a time. It models what the hardware computes on each edge: registers latch on the rising edge of their domain's clock, synchronous resets take effect on that edge, and asynchronous resets take effect as soon as they're propagated. It doesn't model metastability; a register sampling a signal from another clock simply sees the value that signal had at the last [`prop`](Simulator::prop).
//!
//! # Examples
//!
//! ```
//! use sakai::cdc::*;
//! use sakai::sim::*;
//! use sakai::*;
//!
//! let c = Context::new();
//!
//! let top = c.module("top", "Top");
//! let multi_reg = MultiReg::new(MultiRegConfig {
//!     width: 8,
//!     ..Default::default()
//! })
//! .unwrap()
//! .elaborate(top, "multi_reg", &GenericPlatform);
//! multi_reg.i.drive(top.input("i", 8).value);
//! top.output("o", multi_reg.o.value());
//!
//! let mut sim = Simulator::new(top).unwrap();
//!
//! sim.set_input("i", 0xa5);
//! sim.prop();
//! sim.posedge("sync");
//! assert_eq!(sim.output("o"), 0);
//! sim.posedge("sync");
//! assert_eq!(sim.output("o"), 0xa5);
//! ```

mod compiler;
mod ir;

use compiler::*;
use ir::*;

use crate::graph::Module;
use crate::runtime::tracing::{Trace, TraceValue, TraceValueType};
use crate::validation::{validate_module_hierarchy, ValidationError};

use tracing::trace;

use std::collections::HashMap;
use std::io;

/// An error preventing a module hierarchy from being simulated.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SimError {
    /// The hierarchy failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The hierarchy contains a platform-native cell, whose behavior is unknown.
    #[error("module \"{module}\" contains a cell called \"{cell}\" of type \"{kind}\", which can't be simulated")]
    UnsupportedCell {
        /// Path of the module containing the cell.
        module: String,
        /// Instance name of the cell.
        cell: String,
        /// The primitive type of the cell.
        kind: String,
    },
}

/// A simulation of a module hierarchy.
///
/// Inputs and outputs are those of the root module, addressed by name. Registers anywhere in the hierarchy can be observed with [`peek`](Self::peek).
///
/// Combinational values are only recomputed by [`prop`](Self::prop) and [`posedge`](Self::posedge), so call `prop` after changing inputs or resets before reading outputs.
pub struct Simulator {
    program: Program,

    values: Vec<u128>,
    inputs: Vec<u128>,
    regs: Vec<u128>,
    mem_contents: Vec<HashMap<u128, u128>>,
    mem_read_ports: Vec<u128>,
    external_resets: Vec<bool>,
}

impl Simulator {
    /// Validates the hierarchy rooted at `m` and prepares it for simulation.
    ///
    /// Registers start at their reset values, memories at their initial contents (or zero), memory read ports at zero, and every input and external reset low.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Validation`] if the hierarchy doesn't pass [`validate_module_hierarchy`], or [`SimError::UnsupportedCell`] if it contains a cell that any simulated value depends on.
    pub fn new<'a>(m: &'a Module<'a>) -> Result<Simulator, SimError> {
        validate_module_hierarchy(m)?;
        let program = Compiler::compile(m)?;
        trace!("Created simulator for {}", m.path());

        let regs = program.regs.iter().map(|reg| reg.reset_value).collect();
        let mem_contents = program
            .mems
            .iter()
            .map(|mem| {
                mem.initial_contents
                    .iter()
                    .enumerate()
                    .map(|(address, value)| (address as u128, *value))
                    .collect()
            })
            .collect();

        let mut sim = Simulator {
            values: Vec::with_capacity(program.nodes.len()),
            inputs: vec![0; program.inputs.len()],
            regs,
            mem_contents,
            mem_read_ports: vec![0; program.read_ports.len()],
            external_resets: vec![false; program.domains.len()],

            program,
        };
        sim.prop();
        Ok(sim)
    }

    /// Sets the root module's input called `name` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if the root module has no such input, or if `value` doesn't fit into its bit width.
    pub fn set_input(&mut self, name: &str, value: u128) {
        let index = match self
            .program
            .inputs
            .iter()
            .position(|input| input.name == name)
        {
            Some(index) => index,
            None => panic!("Cannot set input \"{}\", as the simulated module has no such input.", name),
        };
        let bit_width = self.program.inputs[index].bit_width;
        if value & !mask(bit_width) != 0 {
            panic!(
                "Cannot set input \"{}\" to {}, as it doesn't fit into {} bit(s).",
                name, value, bit_width
            );
        }
        self.inputs[index] = value;
    }

    /// Asserts or deasserts the external reset of the global clock domain called `domain`.
    ///
    /// A global domain is in reset while its external reset or any of its internal reset drivers is asserted.
    ///
    /// # Panics
    ///
    /// Panics if nothing in the hierarchy uses a global domain called `domain`.
    pub fn set_reset(&mut self, domain: &str, reset: bool) {
        let index = match self
            .program
            .domains
            .iter()
            .position(|d| d.global && d.name == domain)
        {
            Some(index) => index,
            None => panic!(
                "Cannot set the reset of domain \"{}\", as the simulated module uses no global domain by that name.",
                domain
            ),
        };
        self.external_resets[index] = reset;
    }

    /// Recomputes every combinational value, and applies asynchronous resets.
    pub fn prop(&mut self) {
        loop {
            self.eval();

            let mut changed = false;
            for (index, reg) in self.program.regs.iter().enumerate() {
                let domain = &self.program.domains[reg.domain];
                if domain.async_reset
                    && !reg.reset_less
                    && self.is_reset_asserted(reg.domain)
                    && self.regs[index] != reg.reset_value
                {
                    self.regs[index] = reg.reset_value;
                    changed = true;
                }
            }

            // Forcing a register to its reset value is idempotent, so this settles
            if !changed {
                break;
            }
        }
    }

    /// Simulates a rising edge of the clock called `clock`.
    ///
    /// Every register and memory port whose domain resolves to `clock` is updated from the values propagated before the edge, and the new values are propagated afterwards. Memory read ports see the contents from before any write on the same edge.
    pub fn posedge(&mut self, clock: &str) {
        self.prop();

        let mut regs = self.regs.clone();
        for (index, reg) in self.program.regs.iter().enumerate() {
            if reg.clock != clock {
                continue;
            }
            regs[index] = if !reg.reset_less && self.is_reset_asserted(reg.domain) {
                reg.reset_value
            } else {
                self.values[reg.next]
            };
        }

        for (index, port) in self.program.read_ports.iter().enumerate() {
            if port.clock == clock && self.values[port.enable] != 0 {
                let address = self.values[port.address];
                self.mem_read_ports[index] = self.mem_contents[port.mem]
                    .get(&address)
                    .copied()
                    .unwrap_or(0);
            }
        }

        for (index, mem) in self.program.mems.iter().enumerate() {
            if let Some(port) = &mem.write_port {
                if port.clock == clock && self.values[port.enable] != 0 {
                    self.mem_contents[index]
                        .insert(self.values[port.address], self.values[port.value]);
                }
            }
        }

        self.regs = regs;
        self.prop();
    }

    /// The current value of the root module's output called `name`.
    ///
    /// # Panics
    ///
    /// Panics if the root module has no such output.
    pub fn output(&self, name: &str) -> u128 {
        match self
            .program
            .outputs
            .iter()
            .find(|output| output.name == name)
        {
            Some(output) => self.values[output.node],
            None => panic!("Cannot read output \"{}\", as the simulated module has no such output.", name),
        }
    }

    /// The current value of the register at `path`, relative to the root module, eg. `"sync_io.itoggle"`.
    ///
    /// # Panics
    ///
    /// Panics if there's no register at `path`.
    pub fn peek(&self, path: &str) -> u128 {
        match self.program.reg_paths.get(path) {
            Some(&index) => self.regs[index],
            None => panic!("Cannot peek register \"{}\", as the simulated module has no such register.", path),
        }
    }

    /// Whether the clock domain called `domain` is currently in reset.
    ///
    /// Global domains are named as they are, and local domains by the path of their declaring module and their name, eg. `"top.reset_sync:_reset_sync"`.
    ///
    /// # Panics
    ///
    /// Panics if nothing in the hierarchy uses a domain called `domain`.
    pub fn domain_reset(&self, domain: &str) -> bool {
        match self.program.domains.iter().position(|d| d.name == domain) {
            Some(index) => self.is_reset_asserted(index),
            None => panic!("Cannot query the reset of domain \"{}\", as the simulated module uses no domain by that name.", domain),
        }
    }

    /// Declares the root module's inputs, outputs, and every register in the hierarchy on `trace`, and returns a [`Tracer`] that records their values.
    ///
    /// # Errors
    ///
    /// Returns any error produced by `trace`.
    pub fn trace<T: Trace>(&self, mut trace: T) -> io::Result<Tracer<T>> {
        let mut signals = Vec::new();

        let scope = &self.program.scope;
        trace.push_module(&scope.instance_name)?;
        for (index, input) in self.program.inputs.iter().enumerate() {
            let id = trace.add_signal(
                &input.name,
                input.bit_width,
                TraceValueType::from_bit_width(input.bit_width),
            )?;
            signals.push((TraceSource::Input(index), input.bit_width, id));
        }
        for output in self.program.outputs.iter() {
            let bit_width = self.program.nodes[output.node].bit_width;
            let id = trace.add_signal(
                &output.name,
                bit_width,
                TraceValueType::from_bit_width(bit_width),
            )?;
            signals.push((TraceSource::Node(output.node), bit_width, id));
        }
        self.trace_regs(&mut trace, scope, &mut signals)?;
        trace.pop_module()?;

        Ok(Tracer { trace, signals })
    }

    fn trace_regs<T: Trace>(
        &self,
        trace: &mut T,
        scope: &Scope,
        signals: &mut Vec<(TraceSource, u32, T::SignalId)>,
    ) -> io::Result<()> {
        for &index in scope.regs.iter() {
            let reg = &self.program.regs[index];
            let id = trace.add_signal(
                &reg.name,
                reg.bit_width,
                TraceValueType::from_bit_width(reg.bit_width),
            )?;
            signals.push((TraceSource::Reg(index), reg.bit_width, id));
        }
        for child in scope.children.iter() {
            trace.push_module(&child.instance_name)?;
            self.trace_regs(trace, child, signals)?;
            trace.pop_module()?;
        }
        Ok(())
    }

    fn eval(&mut self) {
        eval(
            &self.program.nodes,
            &State {
                inputs: &self.inputs,
                regs: &self.regs,
                mem_read_ports: &self.mem_read_ports,
            },
            &mut self.values,
        );
    }

    fn is_reset_asserted(&self, domain: usize) -> bool {
        self.external_resets[domain]
            || self.program.domains[domain]
                .drivers
                .iter()
                .any(|&driver| self.values[driver] != 0)
    }

    fn source_value(&self, source: TraceSource) -> u128 {
        match source {
            TraceSource::Input(index) => self.inputs[index],
            TraceSource::Node(node) => self.values[node],
            TraceSource::Reg(index) => self.regs[index],
        }
    }
}

#[derive(Clone, Copy)]
enum TraceSource {
    Input(usize),
    Node(NodeId),
    Reg(usize),
}

/// Records the values of a [`Simulator`]'s signals on a [`Trace`], created by [`Simulator::trace`].
pub struct Tracer<T: Trace> {
    trace: T,
    signals: Vec<(TraceSource, u32, T::SignalId)>,
}

impl<T: Trace> Tracer<T> {
    /// Records the current values of every traced signal of `sim` at `time_stamp`.
    ///
    /// # Errors
    ///
    /// Returns any error produced by the underlying trace.
    pub fn update(&mut self, sim: &Simulator, time_stamp: u64) -> io::Result<()> {
        self.trace.update_time_stamp(time_stamp)?;
        for (source, bit_width, id) in self.signals.iter() {
            let value = TraceValue::from_bits(sim.source_value(*source), *bit_width);
            self.trace.update_signal(id, value)?;
        }
        Ok(())
    }

    /// Returns the underlying trace.
    pub fn into_inner(self) -> T {
        self.trace
    }
}
