use super::ir::*;
use super::SimError;

use crate::graph::domain::{resolve_clock, resolve_domain, DomainRef};
use crate::graph::module::Module;
use crate::graph::port::InputData;
use crate::graph::register::RegisterData;
use crate::graph::signal::{Signal, SignalData};
use crate::validation::ValidationError;

use tracing::trace;

use std::collections::{BTreeMap, HashMap};

pub(crate) struct CompiledInput {
    pub name: String,
    pub bit_width: u32,
}

pub(crate) struct CompiledOutput {
    pub name: String,
    pub node: NodeId,
}

pub(crate) struct CompiledRegister {
    pub name: String,
    pub bit_width: u32,
    pub clock: String,
    pub domain: usize,
    pub reset_value: u128,
    pub reset_less: bool,
    pub next: NodeId,
}

pub(crate) struct CompiledDomain {
    pub name: String,
    pub clock: String,
    pub async_reset: bool,
    pub global: bool,
    pub drivers: Vec<NodeId>,
}

pub(crate) struct CompiledWritePort {
    pub clock: String,
    pub address: NodeId,
    pub value: NodeId,
    pub enable: NodeId,
}

pub(crate) struct CompiledMem {
    pub initial_contents: Vec<u128>,
    pub write_port: Option<CompiledWritePort>,
}

pub(crate) struct CompiledReadPort {
    pub mem: usize,
    pub clock: String,
    pub address: NodeId,
    pub enable: NodeId,
}

/// A module instance in the flattened design, kept for naming registers.
pub(crate) struct Scope {
    pub instance_name: String,
    pub regs: Vec<usize>,
    pub children: Vec<Scope>,
}

/// A module hierarchy flattened into an evaluation order.
pub(crate) struct Program {
    pub nodes: Vec<Node>,
    pub inputs: Vec<CompiledInput>,
    pub outputs: Vec<CompiledOutput>,
    pub regs: Vec<CompiledRegister>,
    pub mems: Vec<CompiledMem>,
    pub read_ports: Vec<CompiledReadPort>,
    pub domains: Vec<CompiledDomain>,
    pub reg_paths: BTreeMap<String, usize>,
    pub scope: Scope,
}

pub(crate) struct Compiler<'a> {
    program: Program,

    signal_nodes: HashMap<*const Signal<'a>, NodeId>,
    input_indices: HashMap<*const InputData<'a>, usize>,
    reg_indices: HashMap<*const RegisterData<'a>, usize>,
    read_port_indices: HashMap<*const Signal<'a>, usize>,
    domain_indices: HashMap<String, usize>,
}

impl<'a> Compiler<'a> {
    pub fn compile(m: &'a Module<'a>) -> Result<Program, SimError> {
        let mut compiler = Compiler {
            program: Program {
                nodes: Vec::new(),
                inputs: Vec::new(),
                outputs: Vec::new(),
                regs: Vec::new(),
                mems: Vec::new(),
                read_ports: Vec::new(),
                domains: Vec::new(),
                reg_paths: BTreeMap::new(),
                scope: Scope {
                    instance_name: m.instance_name.clone(),
                    regs: Vec::new(),
                    children: Vec::new(),
                },
            },

            signal_nodes: HashMap::new(),
            input_indices: HashMap::new(),
            reg_indices: HashMap::new(),
            read_port_indices: HashMap::new(),
            domain_indices: HashMap::new(),
        };

        for (name, input) in m.inputs.borrow().iter() {
            compiler
                .input_indices
                .insert(input.data as *const _, compiler.program.inputs.len());
            compiler.program.inputs.push(CompiledInput {
                name: name.clone(),
                bit_width: input.data.bit_width,
            });
        }

        // State elements first, so signals can refer to them by index
        let mut pending = Vec::new();
        let scope = compiler.gather_state(m, "", &mut pending)?;
        compiler.program.scope = scope;

        for item in pending {
            compiler.compile_pending(item)?;
        }

        for (name, output) in m.outputs.borrow().iter() {
            let node = compiler.compile_signal(output.data.source)?;
            compiler.program.outputs.push(CompiledOutput {
                name: name.clone(),
                node,
            });
        }

        trace!(
            "Compiled {} into {} node(s), {} register(s), {} memory(s), {} domain(s)",
            m.path(),
            compiler.program.nodes.len(),
            compiler.program.regs.len(),
            compiler.program.mems.len(),
            compiler.program.domains.len()
        );

        Ok(compiler.program)
    }

    fn gather_state(
        &mut self,
        m: &'a Module<'a>,
        prefix: &str,
        pending: &mut Vec<Pending<'a>>,
    ) -> Result<Scope, SimError> {
        let mut scope = Scope {
            instance_name: m.instance_name.clone(),
            regs: Vec::new(),
            children: Vec::new(),
        };

        for register in m.registers.borrow().iter() {
            let data = register.data;
            let next = match *data.next.borrow() {
                Some(next) => next,
                None => {
                    return Err(ValidationError::UndrivenRegister {
                        module: m.path(),
                        register: data.name.clone(),
                    }
                    .into())
                }
            };
            let domain = self.domain(m, &data.domain);
            let index = self.program.regs.len();
            self.reg_indices.insert(data as *const _, index);
            self.program.regs.push(CompiledRegister {
                name: data.name.clone(),
                bit_width: data.bit_width,
                clock: resolve_clock(m, &data.domain),
                domain,
                reset_value: register.reset_value(),
                reset_less: *data.reset_less.borrow(),
                next: 0,
            });
            self.program
                .reg_paths
                .insert(format!("{}{}", prefix, data.name), index);
            scope.regs.push(index);
            pending.push(Pending::RegNext { index, next });
        }

        for mem in m.mems.borrow().iter() {
            let index = self.program.mems.len();
            let initial_contents: Vec<u128> = mem
                .initial_contents
                .borrow()
                .as_ref()
                .map(|contents| contents.iter().map(|x| x.value()).collect())
                .unwrap_or_default();
            self.program.mems.push(CompiledMem {
                initial_contents,
                write_port: None,
            });

            if let Some(port) = mem.write_port.borrow().as_ref() {
                pending.push(Pending::WritePort {
                    mem: index,
                    clock: resolve_clock(m, &port.domain),
                    address: port.address,
                    value: port.value,
                    enable: port.enable,
                });
            }

            for read_port in mem.read_ports.borrow().iter() {
                let read_port: &'a Signal<'a> = *read_port;
                if let SignalData::MemReadPortOutput {
                    domain,
                    address,
                    enable,
                    ..
                } = &read_port.data
                {
                    self.read_port_indices
                        .insert(read_port as *const _, self.program.read_ports.len());
                    self.program.read_ports.push(CompiledReadPort {
                        mem: index,
                        clock: resolve_clock(m, domain),
                        address: 0,
                        enable: 0,
                    });
                    pending.push(Pending::ReadPort {
                        index: self.program.read_ports.len() - 1,
                        address: *address,
                        enable: *enable,
                    });
                }
            }
        }

        for (domain, reset) in m.reset_drivers.borrow().iter() {
            let domain = self.domain(m, domain);
            pending.push(Pending::ResetDriver {
                domain,
                reset: *reset,
            });
        }

        for child in m.modules.borrow().iter() {
            let prefix = format!("{}{}.", prefix, child.instance_name);
            let child_scope = self.gather_state(child, &prefix, pending)?;
            scope.children.push(child_scope);
        }

        Ok(scope)
    }

    fn compile_pending(&mut self, item: Pending<'a>) -> Result<(), SimError> {
        match item {
            Pending::RegNext { index, next } => {
                self.program.regs[index].next = self.compile_signal(next)?;
            }
            Pending::WritePort {
                mem,
                clock,
                address,
                value,
                enable,
            } => {
                let write_port = CompiledWritePort {
                    clock,
                    address: self.compile_signal(address)?,
                    value: self.compile_signal(value)?,
                    enable: self.compile_signal(enable)?,
                };
                self.program.mems[mem].write_port = Some(write_port);
            }
            Pending::ReadPort {
                index,
                address,
                enable,
            } => {
                let address = self.compile_signal(address)?;
                let enable = self.compile_signal(enable)?;
                let read_port = &mut self.program.read_ports[index];
                read_port.address = address;
                read_port.enable = enable;
            }
            Pending::ResetDriver { domain, reset } => {
                let reset = self.compile_signal(reset)?;
                self.program.domains[domain].drivers.push(reset);
            }
        }

        Ok(())
    }

    fn domain(&mut self, m: &'a Module<'a>, name: &str) -> usize {
        let resolved = resolve_domain(m, name);
        let qualified_name = resolved.qualified_name();
        if let Some(&index) = self.domain_indices.get(&qualified_name) {
            return index;
        }

        let (async_reset, global) = match resolved {
            DomainRef::Local(domain) => (domain.async_reset, false),
            DomainRef::Global(_) => (false, true),
        };
        let index = self.program.domains.len();
        self.program.domains.push(CompiledDomain {
            name: qualified_name.clone(),
            clock: resolve_clock(m, name),
            async_reset,
            global,
            drivers: Vec::new(),
        });
        self.domain_indices.insert(qualified_name, index);
        index
    }

    fn compile_signal(&mut self, signal: &'a Signal<'a>) -> Result<NodeId, SimError> {
        // Operands are lowered before the signals that use them, with an explicit stack so deep mux trees can't overflow
        let mut frames = vec![Frame::Enter(signal)];
        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Enter(signal) => {
                    if self.signal_nodes.contains_key(&(signal as *const _)) {
                        continue;
                    }
                    frames.push(Frame::Lower(signal));
                    for operand in self.operands(signal)? {
                        if !self.signal_nodes.contains_key(&(operand as *const _)) {
                            frames.push(Frame::Enter(operand));
                        }
                    }
                }
                Frame::Lower(signal) => {
                    let key = signal as *const _;
                    if !self.signal_nodes.contains_key(&key) {
                        let node = self.lower(signal)?;
                        self.signal_nodes.insert(key, node);
                    }
                }
            }
        }

        Ok(self.node(signal))
    }

    fn operands(&self, signal: &'a Signal<'a>) -> Result<Vec<&'a Signal<'a>>, SimError> {
        Ok(match &signal.data {
            SignalData::Lit { .. }
            | SignalData::Reg { .. }
            | SignalData::CellOutput { .. }
            | SignalData::MemReadPortOutput { .. } => Vec::new(),

            SignalData::Input { data } => {
                if self.input_indices.contains_key(&(*data as *const _)) {
                    Vec::new()
                } else {
                    vec![driven_value(data)?]
                }
            }
            SignalData::Output { data } => vec![data.source],

            SignalData::UnOp { source, .. } | SignalData::Bits { source, .. } => vec![*source],
            SignalData::BinOp { lhs, rhs, .. } | SignalData::Concat { lhs, rhs } => {
                vec![*lhs, *rhs]
            }
            SignalData::Mux {
                cond,
                when_true,
                when_false,
            } => vec![*cond, *when_true, *when_false],
        })
    }

    fn node(&self, signal: &'a Signal<'a>) -> NodeId {
        self.signal_nodes[&(signal as *const _)]
    }

    fn lower(&mut self, signal: &'a Signal<'a>) -> Result<NodeId, SimError> {
        let expr = match &signal.data {
            SignalData::Lit { value, .. } => Expr::Constant {
                value: value.value(),
            },

            SignalData::Input { data } => match self.input_indices.get(&(*data as *const _)) {
                Some(&index) => Expr::Input { index },
                // Child inputs are aliases for whatever their parent drives them with
                None => return Ok(self.node(driven_value(data)?)),
            },
            SignalData::Output { data } => return Ok(self.node(data.source)),

            SignalData::Reg { data } => Expr::Reg {
                index: self.reg_indices[&(*data as *const _)],
            },

            SignalData::CellOutput { cell, .. } => {
                return Err(SimError::UnsupportedCell {
                    module: signal.module().path(),
                    cell: cell.instance_name.clone(),
                    kind: cell.kind.clone(),
                })
            }

            SignalData::UnOp { source, op, .. } => Expr::UnOp {
                source: self.node(source),
                op: (*op).into(),
            },
            SignalData::BinOp { lhs, rhs, op, .. } => Expr::BinOp {
                lhs: self.node(lhs),
                rhs: self.node(rhs),
                op: (*op).into(),
            },

            SignalData::Bits {
                source, range_low, ..
            } => Expr::Bits {
                source: self.node(source),
                range_low: *range_low,
            },

            SignalData::Concat { lhs, rhs } => Expr::Concat {
                lhs: self.node(lhs),
                rhs: self.node(rhs),
                rhs_bit_width: rhs.bit_width(),
            },

            SignalData::Mux {
                cond,
                when_true,
                when_false,
            } => Expr::Mux {
                cond: self.node(cond),
                when_true: self.node(when_true),
                when_false: self.node(when_false),
            },

            SignalData::MemReadPortOutput { .. } => Expr::MemReadPort {
                index: self.read_port_indices[&(signal as *const _)],
            },
        };

        let node = self.program.nodes.len();
        self.program.nodes.push(Node {
            expr,
            bit_width: signal.bit_width(),
        });
        Ok(node)
    }
}

fn driven_value<'a>(data: &'a InputData<'a>) -> Result<&'a Signal<'a>, SimError> {
    let driven_value = *data.driven_value.borrow();
    match driven_value {
        Some(driven_value) => Ok(driven_value),
        None => Err(ValidationError::UndrivenInput {
            module: data.module.path(),
            input: data.name.clone(),
        }
        .into()),
    }
}

enum Frame<'a> {
    Enter(&'a Signal<'a>),
    Lower(&'a Signal<'a>),
}

enum Pending<'a> {
    RegNext {
        index: usize,
        next: &'a Signal<'a>,
    },
    WritePort {
        mem: usize,
        clock: String,
        address: &'a Signal<'a>,
        value: &'a Signal<'a>,
        enable: &'a Signal<'a>,
    },
    ReadPort {
        index: usize,
        address: &'a Signal<'a>,
        enable: &'a Signal<'a>,
    },
    ResetDriver {
        domain: usize,
        reset: &'a Signal<'a>,
    },
}
