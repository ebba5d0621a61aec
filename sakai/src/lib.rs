//! Clock domain crossing primitives for an [HDL](https://en.wikipedia.org/wiki/Hardware_description_language) embedded in [Rust](https://www.rust-lang.org/).
//!
//! sakai provides an API to describe [`Module`]s composed of [`Signal`]s and clocked [`Register`]s, and a set of [`cdc`] generators that elaborate the synchronizers, buffers, and gearboxes a design needs wherever data moves from one clock domain to another.
//!
//! Registers and memory ports name the clock domain they're clocked by. Modules may declare local domains that follow another domain's clock, which is how a [`ResetSynchronizer`](cdc::ResetSynchronizer) gets a chain with an asynchronous reset.
//!
//! Elaborated hierarchies can be checked with [`validation`] and run cycle by cycle with the reference [`Simulator`](sim::Simulator).
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! sakai = "0.1"
//! ```
//!
//! # Examples
//!
//! ```rust
//! use sakai::cdc::*;
//! use sakai::*;
//!
//! // Create a context, which will contain our module(s)
//! let c = Context::new();
//!
//! // Create a module with a pulse input in the "sys" domain
//! let top = c.module("top", "Top");
//! let pulse = top.input("pulse", 1);
//!
//! // Carry the pulse into the "pix" domain
//! let pulse_sync = PulseSynchronizer::new(PulseSynchronizerConfig {
//!     idomain: "sys".into(),
//!     odomain: "pix".into(),
//!     ..Default::default()
//! })
//! .unwrap()
//! .elaborate(top, "pulse_sync", &GenericPlatform);
//! pulse_sync.i.drive(pulse.value);
//! top.output("pix_pulse", pulse_sync.o.value());
//!
//! // No data moves between the domains outside the synchronizer
//! assert!(sakai::validation::find_unsynchronized_crossings(top).is_empty());
//! ```

// Must be kept up-to-date with version in Cargo.toml
#![doc(html_root_url = "https://docs.rs/sakai/0.1.0")]

mod graph;
pub mod cdc;
pub mod runtime;
pub mod sim;
pub mod validation;

pub use graph::*;
