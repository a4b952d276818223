//! Fluent traversal-script builder.
//!
//! [`Traversal`] accumulates the textual script; [`Arg`] / [`StepArg`]
//! carry step arguments through classification. Step methods live in
//! `steps`, one per traversal-language step.

mod arg;
mod query;
mod steps;

#[cfg(test)]
mod tests;

pub use arg::{classify, Arg, StepArg};
pub use query::{Args, Traversal};
