//! Structural checks over an elaborated module hierarchy.

use crate::graph::domain::{resolve_clock, resolve_domain, DomainRef};
use crate::graph::module::Module;
use crate::graph::register::RegisterData;
use crate::graph::signal::{Signal, SignalData};

use tracing::trace;

use std::collections::HashSet;
use std::fmt;
use std::ptr;

/// A structural defect that prevents a module hierarchy from being consumed.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A register whose next value is never specified.
    #[error("module \"{module}\" contains a register called \"{register}\" which is not driven")]
    UndrivenRegister {
        /// Path of the module containing the register.
        module: String,
        /// Name of the register.
        register: String,
    },

    /// A child module input that its parent never drives.
    #[error("module \"{module}\" has an input called \"{input}\" which is not driven by its parent")]
    UndrivenInput {
        /// Path of the child module.
        module: String,
        /// Name of the input.
        input: String,
    },

    /// A memory nothing reads from.
    #[error("module \"{module}\" contains a memory called \"{mem}\" which doesn't have any read ports")]
    MemWithoutReadPorts {
        /// Path of the module containing the memory.
        module: String,
        /// Name of the memory.
        mem: String,
    },

    /// A memory whose contents can't be determined.
    #[error("module \"{module}\" contains a memory called \"{mem}\" which doesn't have initial contents or a write port specified")]
    MemWithoutContents {
        /// Path of the module containing the memory.
        module: String,
        /// Name of the memory.
        mem: String,
    },

    /// A child module output that depends combinationally on itself.
    #[error("module \"{module}\" contains an output called \"{output}\" which forms a combinational loop with itself")]
    CombinationalLoop {
        /// Path of the module containing the output.
        module: String,
        /// Name of the output.
        output: String,
    },

    /// A clock domain whose reset is driven from more than one module.
    #[error("the reset of domain \"{domain}\" is driven from both \"{first}\" and \"{second}\"")]
    MultipleResetDrivers {
        /// Qualified name of the domain.
        domain: String,
        /// Path of the first driving module.
        first: String,
        /// Path of the second driving module.
        second: String,
    },
}

/// Checks the module hierarchy rooted at `m` for structural defects.
///
/// This checks for undriven registers and child module inputs, memories without read ports or without contents, combinational loops through child modules, and domains whose reset is driven from more than one module.
///
/// # Errors
///
/// Returns the first defect found.
///
/// # Examples
///
/// ```
/// use sakai::validation::*;
/// use sakai::*;
///
/// let c = Context::new();
///
/// let m = c.module("m", "MyModule");
/// let r = m.reg("r", 1, "sync");
///
/// assert!(validate_module_hierarchy(m).is_err());
///
/// r.drive_next(!r.value);
///
/// assert!(validate_module_hierarchy(m).is_ok());
/// ```
pub fn validate_module_hierarchy<'a>(m: &'a Module<'a>) -> Result<(), ValidationError> {
    trace!("Validating module hierarchy {}", m.path());
    detect_undriven_registers_and_inputs(m)?;
    detect_mem_errors(m)?;
    detect_combinational_loops(m)?;
    detect_multiple_reset_drivers(m, &mut Vec::new())?;
    Ok(())
}

fn detect_undriven_registers_and_inputs<'a>(m: &'a Module<'a>) -> Result<(), ValidationError> {
    for register in m.registers.borrow().iter() {
        if register.data.next.borrow().is_none() {
            return Err(ValidationError::UndrivenRegister {
                module: m.path(),
                register: register.data.name.clone(),
            });
        }
    }

    for module in m.modules.borrow().iter() {
        for (name, input) in module.inputs.borrow().iter() {
            if input.data.driven_value.borrow().is_none() {
                return Err(ValidationError::UndrivenInput {
                    module: module.path(),
                    input: name.clone(),
                });
            }
        }

        detect_undriven_registers_and_inputs(module)?;
    }

    Ok(())
}

fn detect_mem_errors<'a>(m: &'a Module<'a>) -> Result<(), ValidationError> {
    for mem in m.mems.borrow().iter() {
        if mem.read_ports.borrow().is_empty() {
            return Err(ValidationError::MemWithoutReadPorts {
                module: m.path(),
                mem: mem.name.clone(),
            });
        }

        if mem.initial_contents.borrow().is_none() && mem.write_port.borrow().is_none() {
            return Err(ValidationError::MemWithoutContents {
                module: m.path(),
                mem: mem.name.clone(),
            });
        }
    }

    for module in m.modules.borrow().iter() {
        detect_mem_errors(module)?;
    }

    Ok(())
}

fn detect_combinational_loops<'a>(m: &'a Module<'a>) -> Result<(), ValidationError> {
    for module in m.modules.borrow().iter() {
        for output in module.outputs.borrow().values() {
            let mut loops = false;
            visit_combinational(output.data.source, |signal| {
                if let SignalData::Output { data } = signal.data {
                    if ptr::eq(data, output.data) {
                        loops = true;
                    }
                }
            });
            if loops {
                return Err(ValidationError::CombinationalLoop {
                    module: module.path(),
                    output: output.data.name.clone(),
                });
            }
        }

        detect_combinational_loops(module)?;
    }

    Ok(())
}

fn detect_multiple_reset_drivers<'a>(
    m: &'a Module<'a>,
    seen: &mut Vec<(DomainRef<'a>, String)>,
) -> Result<(), ValidationError> {
    for domain in m.reset_drivers.borrow().keys() {
        let resolved = resolve_domain(m, domain);
        if let Some((_, first)) = seen.iter().find(|(other, _)| *other == resolved) {
            return Err(ValidationError::MultipleResetDrivers {
                domain: resolved.qualified_name(),
                first: first.clone(),
                second: m.path(),
            });
        }
        seen.push((resolved, m.path()));
    }

    for module in m.modules.borrow().iter() {
        detect_multiple_reset_drivers(module, seen)?;
    }

    Ok(())
}

/// Visits every signal `signal` depends on combinationally, including `signal` itself.
///
/// The walk crosses module boundaries through child inputs and outputs, and stops at registers, memory read ports, and cell outputs. Each signal is visited once.
pub(crate) fn visit_combinational<'a, F: FnMut(&'a Signal<'a>)>(signal: &'a Signal<'a>, mut f: F) {
    let mut visited = HashSet::new();
    let mut frames = vec![signal];

    while let Some(signal) = frames.pop() {
        if !visited.insert(signal as *const Signal<'a>) {
            continue;
        }
        f(signal);

        match &signal.data {
            SignalData::Lit { .. } => (),

            SignalData::Input { data } => {
                if let Some(driven_value) = *data.driven_value.borrow() {
                    frames.push(driven_value);
                }
            }
            SignalData::Output { data } => frames.push(data.source),

            SignalData::Reg { .. } => (),
            SignalData::CellOutput { .. } => (),

            SignalData::UnOp { source, .. } => frames.push(*source),
            SignalData::BinOp { lhs, rhs, .. } => {
                frames.push(*lhs);
                frames.push(*rhs);
            }

            SignalData::Bits { source, .. } => frames.push(*source),

            SignalData::Concat { lhs, rhs } => {
                frames.push(*lhs);
                frames.push(*rhs);
            }

            SignalData::Mux {
                cond,
                when_true,
                when_false,
            } => {
                frames.push(*cond);
                frames.push(*when_true);
                frames.push(*when_false);
            }

            SignalData::MemReadPortOutput { .. } => (),
        }
    }
}

/// A path along which data moves from one clock to another without passing through a synchronizer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Crossing {
    /// Path of the register the data comes from.
    pub from: String,
    /// The clock `from` is clocked by.
    pub from_clock: String,
    /// Path of the register or memory port the data goes to.
    pub to: String,
    /// The clock `to` is clocked by.
    pub to_clock: String,
}

impl fmt::Display for Crossing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) -> {} ({})",
            self.from, self.from_clock, self.to, self.to_clock
        )
    }
}

/// Finds every place in the hierarchy rooted at `m` where data moves between clocks without a synchronizer.
///
/// A register, memory port, or domain reset that depends combinationally on a register clocked by a different clock is a crossing. Domains are compared by the top-level clock they resolve to, so a local domain that follows another domain's clock doesn't count as a different clock.
///
/// A crossing is sanctioned, and not reported, when either register is marked [`NO_RETIMING`](crate::NO_RETIMING), as synchronizer stages are. Data read from a memory is never reported, since a dual-port memory with its ports in different domains is itself a crossing mechanism.
///
/// # Examples
///
/// ```
/// use sakai::validation::*;
/// use sakai::*;
///
/// let c = Context::new();
///
/// let m = c.module("m", "MyModule");
/// let a = m.reg("a", 1, "fast");
/// a.drive_next(!a.value);
/// let b = m.reg("b", 1, "slow");
/// b.drive_next(a.value);
///
/// let crossings = find_unsynchronized_crossings(m);
/// assert_eq!(crossings.len(), 1);
/// assert_eq!(crossings[0].to_string(), "m.a (fast) -> m.b (slow)");
/// ```
pub fn find_unsynchronized_crossings<'a>(m: &'a Module<'a>) -> Vec<Crossing> {
    let mut crossings = Vec::new();
    collect_crossings(m, &mut crossings);
    crossings
}

fn collect_crossings<'a>(m: &'a Module<'a>, crossings: &mut Vec<Crossing>) {
    for register in m.registers.borrow().iter() {
        let data = register.data;
        if let Some(next) = *data.next.borrow() {
            let to = format!("{}.{}", m.path(), data.name);
            let to_clock = resolve_clock(m, &data.domain);
            check_sink(next, &to, &to_clock, is_no_retiming(data), crossings);
        }
    }

    for mem in m.mems.borrow().iter() {
        if let Some(port) = mem.write_port.borrow().as_ref() {
            let to = format!("{}.{}[write]", m.path(), mem.name);
            let to_clock = resolve_clock(m, &port.domain);
            for signal in [port.address, port.value, port.enable] {
                check_sink(signal, &to, &to_clock, false, crossings);
            }
        }
        for read_port in mem.read_ports.borrow().iter() {
            if let SignalData::MemReadPortOutput {
                domain,
                address,
                enable,
                ..
            } = &read_port.data
            {
                let to = format!("{}.{}[read]", m.path(), mem.name);
                let to_clock = resolve_clock(m, domain);
                for signal in [*address, *enable] {
                    check_sink(signal, &to, &to_clock, false, crossings);
                }
            }
        }
    }

    for (domain, reset) in m.reset_drivers.borrow().iter() {
        let to = format!("{}:{}[reset]", m.path(), domain);
        check_sink(*reset, &to, &resolve_clock(m, domain), false, crossings);
    }

    for module in m.modules.borrow().iter() {
        collect_crossings(module, crossings);
    }
}

fn check_sink<'a>(
    signal: &'a Signal<'a>,
    to: &str,
    to_clock: &str,
    to_no_retiming: bool,
    crossings: &mut Vec<Crossing>,
) {
    visit_combinational(signal, |source| {
        if let SignalData::Reg { data } = source.data {
            let from_clock = resolve_clock(data.module, &data.domain);
            if from_clock != to_clock && !to_no_retiming && !is_no_retiming(data) {
                crossings.push(Crossing {
                    from: format!("{}.{}", data.module.path(), data.name),
                    from_clock,
                    to: to.to_string(),
                    to_clock: to_clock.to_string(),
                });
            }
        }
    });
}

fn is_no_retiming(data: &RegisterData) -> bool {
    data.attrs.borrow().contains_key(crate::NO_RETIMING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdc::*;
    use crate::*;

    #[test]
    fn undriven_register_error() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let _ = child.reg("r", 1, "sync");

        assert_eq!(
            validate_module_hierarchy(top),
            Err(ValidationError::UndrivenRegister {
                module: "top.child".into(),
                register: "r".into(),
            })
        );
    }

    #[test]
    fn undriven_input_error() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let i = child.input("i", 1);
        child.output("o", i.value);

        let err = validate_module_hierarchy(top).unwrap_err();
        assert_eq!(
            err.to_string(),
            "module \"top.child\" has an input called \"i\" which is not driven by its parent"
        );
    }

    #[test]
    fn mem_without_read_ports_error() {
        let c = Context::new();

        let m = c.module("m", "M");
        let mem = m.mem("mem", 1, 1);
        mem.initial_contents(&[true, false]);

        assert_eq!(
            validate_module_hierarchy(m),
            Err(ValidationError::MemWithoutReadPorts {
                module: "m".into(),
                mem: "mem".into(),
            })
        );
    }

    #[test]
    fn mem_without_contents_error() {
        let c = Context::new();

        let m = c.module("m", "M");
        let mem = m.mem("mem", 1, 1);
        m.output("o", mem.read_port("sync", m.low(), m.high()));

        assert_eq!(
            validate_module_hierarchy(m),
            Err(ValidationError::MemWithoutContents {
                module: "m".into(),
                mem: "mem".into(),
            })
        );
    }

    #[test]
    fn combinational_loop_error() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let i = child.input("i", 1);
        let o = child.output("o", !i.value);
        i.drive(o.value());

        assert_eq!(
            validate_module_hierarchy(top),
            Err(ValidationError::CombinationalLoop {
                module: "top.child".into(),
                output: "o".into(),
            })
        );
    }

    #[test]
    fn registered_feedback_is_not_a_loop() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let child = top.module("child", "Child");
        let i = child.input("i", 1);
        let r = child.reg("r", 1, "sync");
        r.drive_next(i.value);
        let o = child.output("o", !r.value);
        i.drive(o.value());

        assert!(validate_module_hierarchy(top).is_ok());
    }

    #[test]
    fn multiple_reset_drivers_error() {
        let c = Context::new();

        let top = c.module("top", "Top");
        for name in ["a", "b"] {
            let reset_sync = ResetSynchronizer::new(ResetSynchronizerConfig::default()).unwrap();
            let ports = reset_sync.elaborate(top, name, &GenericPlatform);
            ports.arst.drive(top.input(format!("arst_{}", name), 1).value);
        }

        assert_eq!(
            validate_module_hierarchy(top),
            Err(ValidationError::MultipleResetDrivers {
                domain: "sync".into(),
                first: "top.a".into(),
                second: "top.b".into(),
            })
        );
    }

    #[test]
    fn local_reset_domains_are_distinct() {
        let c = Context::new();

        let top = c.module("top", "Top");
        for (name, domain) in [("a", "sync"), ("b", "pix")] {
            let reset_sync = ResetSynchronizer::new(ResetSynchronizerConfig {
                domain: domain.into(),
                n: 2,
            })
            .unwrap();
            let ports = reset_sync.elaborate(top, name, &GenericPlatform);
            ports.arst.drive(top.input(format!("arst_{}", name), 1).value);
        }

        assert!(validate_module_hierarchy(top).is_ok());
    }

    #[test]
    fn unsynchronized_crossing_through_child() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let src = top.reg("src", 4, "a");
        src.drive_next(src.value + top.lit(1u32, 4));

        let child = top.module("child", "Child");
        let i = child.input("i", 4);
        let dst = child.reg("dst", 4, "b");
        dst.drive_next(i.value);
        i.drive(src.value);

        assert_eq!(
            find_unsynchronized_crossings(top),
            vec![Crossing {
                from: "top.src".into(),
                from_clock: "a".into(),
                to: "top.child.dst".into(),
                to_clock: "b".into(),
            }]
        );

        dst.no_retiming();
        assert!(find_unsynchronized_crossings(top).is_empty());
    }

    #[test]
    fn local_domains_compare_by_clock() {
        let c = Context::new();

        let top = c.module("top", "Top");
        top.clock_domain("local", "a", false);
        let src = top.reg("src", 1, "a");
        src.drive_next(!src.value);
        let dst = top.reg("dst", 1, "local");
        dst.drive_next(src.value);

        assert!(find_unsynchronized_crossings(top).is_empty());
    }

    #[test]
    fn primitives_have_no_unsynchronized_crossings() {
        let c = Context::new();

        let top = c.module("top", "Top");
        let platform = GenericPlatform;

        let multi_reg = MultiReg::new(MultiRegConfig {
            width: 4,
            odomain: "b".into(),
            ..Default::default()
        })
        .unwrap()
        .elaborate(top, "multi_reg", &platform);
        let pulse_sync = PulseSynchronizer::new(PulseSynchronizerConfig {
            idomain: "a".into(),
            odomain: "b".into(),
            ..Default::default()
        })
        .unwrap()
        .elaborate(top, "pulse_sync", &platform);
        let bus_sync = BusSynchronizer::new(BusSynchronizerConfig {
            width: 8,
            idomain: "a".into(),
            odomain: "b".into(),
            ..Default::default()
        })
        .unwrap()
        .elaborate(top, "bus_sync", &platform);
        let elastic_buffer = ElasticBuffer::new(ElasticBufferConfig {
            width: 8,
            depth: 4,
            idomain: "a".into(),
            odomain: "b".into(),
        })
        .unwrap()
        .elaborate(top, "elastic_buffer", &platform);
        let gearbox = Gearbox::new(GearboxConfig {
            iwidth: 8,
            idomain: "a".into(),
            owidth: 2,
            odomain: "b".into(),
        })
        .unwrap()
        .elaborate(top, "gearbox", &platform);
        let reset_sync = ResetSynchronizer::new(ResetSynchronizerConfig {
            domain: "b".into(),
            n: 2,
        })
        .unwrap()
        .elaborate(top, "reset_sync", &platform);

        // Feed each primitive from a register in the input domain
        let src = top.reg("src", 8, "a");
        src.drive_next(src.value + top.lit(1u32, 8));
        multi_reg.i.drive(src.value.bits(3, 0));
        pulse_sync.i.drive(src.value.bit(0));
        bus_sync.i.drive(src.value);
        elastic_buffer.i.drive(src.value);
        gearbox.i.drive(src.value);
        reset_sync.arst.drive(top.input("arst", 1).value);

        assert!(validate_module_hierarchy(top).is_ok());
        assert_eq!(find_unsynchronized_crossings(top), Vec::new());
    }
}
