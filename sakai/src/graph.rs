pub(crate) mod cell;
pub(crate) mod constant;
pub(crate) mod context;
pub(crate) mod domain;
pub(crate) mod mem;
pub(crate) mod module;
pub(crate) mod port;
pub(crate) mod register;
pub(crate) mod signal;
mod sugar;

pub use cell::*;
pub use constant::*;
pub use context::*;
pub use domain::*;
pub use mem::*;
pub use module::*;
pub use port::*;
pub use register::*;
pub use signal::*;
