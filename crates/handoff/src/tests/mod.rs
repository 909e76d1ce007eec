//! Test suites for the worker bootstrap.

pub(crate) mod support;
