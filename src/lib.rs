//! # `abcross`
//!
//! Helpers for preparing cross-architecture build roots on AOSC OS.
//!
//! - [`Architecture`] lists the supported architectures along with their
//!   QEMU names, QEMU static interpreters and standard sysroots.
//! - [`Binfmt`] checks that the kernel's `binfmt_misc` registration for an
//!   architecture points at the right QEMU static interpreter.
//! - [`regular_call`] and [`privileged_call`] run external commands, the
//!   latter escalating privileges when needed.
//!
//! Nothing here creates sysroots or registers binfmt handlers; callers
//! decide what to do with the answers.

#![deny(missing_debug_implementations, rust_2018_idioms)]
#![warn(
    clippy::explicit_into_iter_loop,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inefficient_to_string,
    clippy::map_err_ignore,
    clippy::map_unwrap_or,
    clippy::ref_binding_to_reference,
    clippy::semicolon_if_nothing_returned,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::unwrap_used
)]

pub mod arch;
pub mod binfmt;
pub mod call;
pub mod config;
pub mod errors;
mod extensions;
pub mod file;
pub mod shell;

pub use self::arch::Architecture;
pub use self::binfmt::{Binfmt, BinfmtEntry, Unavailable};
pub use self::call::{privileged_call, regular_call, CallOutput, Host, System};
pub use self::config::Config;
pub use self::errors::{install_panic_hook, Result};
pub use self::extensions::{Argv, CommandExt, OutputExt};

#[macro_export]
macro_rules! commit_info {
    () => {
        include_str!(concat!(env!("OUT_DIR"), "/commit-info.txt"))
    };
}

/// Short git hash and date of the build, empty outside a checkout.
pub const fn commit_info() -> &'static str {
    commit_info!()
}
