use super::module::*;

use std::ptr;

/// A clock domain declared locally in a [`Module`], created by [`Module::clock_domain`].
///
/// Registers and memory ports name the domain they're clocked by. A name resolves to the nearest declaration in the naming module or one of its ancestors; a name with no declaration refers to a top-level (global) domain of that name.
pub struct ClockDomain<'a> {
    pub(crate) module: &'a Module<'a>,

    pub(crate) name: String,
    pub(crate) clock_from: String,
    pub(crate) async_reset: bool,
}

impl<'a> ClockDomain<'a> {
    /// The local name of this domain.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the domain this domain takes its clock from, as seen from the declaring module's parent.
    pub fn clock_from(&self) -> &str {
        &self.clock_from
    }

    /// Whether or not this domain's reset takes effect without waiting for a clock edge.
    pub fn async_reset(&self) -> bool {
        self.async_reset
    }

    /// The module this domain is declared in.
    pub fn module(&self) -> &'a Module<'a> {
        self.module
    }
}

/// What a clock domain name refers to, as seen from a particular [`Module`].
#[derive(Clone)]
pub enum DomainRef<'a> {
    /// A domain declared in the module or one of its ancestors.
    Local(&'a ClockDomain<'a>),
    /// A top-level domain.
    Global(String),
}

impl<'a> DomainRef<'a> {
    /// A stable name for this domain, suitable for reporting: the global name, or the declaring module's path and the local name.
    pub fn qualified_name(&self) -> String {
        match self {
            DomainRef::Local(domain) => format!("{}:{}", domain.module.path(), domain.name),
            DomainRef::Global(name) => name.clone(),
        }
    }
}

impl<'a> PartialEq for DomainRef<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DomainRef::Local(a), DomainRef::Local(b)) => ptr::eq(*a, *b),
            (DomainRef::Global(a), DomainRef::Global(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> Eq for DomainRef<'a> {}

/// Resolves the clock domain called `name` as seen from `module`.
pub fn resolve_domain<'a>(module: &'a Module<'a>, name: &str) -> DomainRef<'a> {
    let mut scope = Some(module);
    while let Some(m) = scope {
        if let Some(domain) = m.domains.borrow().get(name) {
            return DomainRef::Local(*domain);
        }
        scope = m.parent;
    }
    DomainRef::Global(name.to_string())
}

/// Resolves the top-level clock that drives the clock domain called `name` as seen from `module`.
///
/// Local domains share their clock with the domain they were declared from, so this follows `clock_from` declarations until it reaches a top-level domain.
pub fn resolve_clock<'a>(module: &'a Module<'a>, name: &str) -> String {
    match resolve_domain(module, name) {
        DomainRef::Local(domain) => match domain.module.parent {
            Some(parent) => resolve_clock(parent, &domain.clock_from),
            None => domain.clock_from.clone(),
        },
        DomainRef::Global(name) => name,
    }
}
