//! Bridge from the synchronous `PathSolver` trait onto Tokio.

use std::future::Future;
use std::io;

use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

/// Error type for solver construction failures.
#[derive(Debug)]
pub enum SolverBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(io::Error),
    /// A numeric solver parameter was outside its accepted range.
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
}

impl std::fmt::Display for SolverBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
            Self::OutOfRange {
                name,
                value,
                min,
                max,
            } => write!(f, "{name} must be within {min}..={max}, got {value}"),
        }
    }
}

impl std::error::Error for SolverBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
            Self::OutOfRange { .. } => None,
        }
    }
}

/// Owned current-thread runtime used when the caller is not already inside a
/// multi-threaded one.
pub(crate) struct BlockingRuntime {
    runtime: Runtime,
}

impl std::fmt::Debug for BlockingRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<tokio::runtime::Runtime>")
    }
}

impl BlockingRuntime {
    pub(crate) fn new() -> Result<Self, SolverBuildError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SolverBuildError::Runtime)?;
        Ok(Self { runtime })
    }

    /// Drive `future` to completion from synchronous code.
    ///
    /// Inside a multi-threaded runtime the caller's handle is used through
    /// `block_in_place`; otherwise (no runtime, or a `current_thread` one) the
    /// owned runtime runs it.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

/// Reject `value` unless it lies within `min..=max`.
pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), SolverBuildError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SolverBuildError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    fn runs_outside_any_runtime() {
        let runtime = BlockingRuntime::new().expect("runtime builds");
        assert_eq!(runtime.block_on(async { 7 }), 7);
    }

    #[rstest]
    fn runs_inside_multi_threaded_runtime() {
        let outer = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("outer runtime builds");
        let runtime = Arc::new(BlockingRuntime::new().expect("runtime builds"));
        let inner = Arc::clone(&runtime);
        let task = outer.spawn(async move { inner.block_on(async { 11 }) });
        let value = outer.block_on(task).expect("task joins");
        assert_eq!(value, 11);
    }

    #[rstest]
    #[case(50.0, true)]
    #[case(5.0, true)]
    #[case(150.0, true)]
    #[case(4.9, false)]
    #[case(f64::NAN, false)]
    fn range_checks_are_inclusive(#[case] value: f64, #[case] ok: bool) {
        assert_eq!(check_range("speed", value, 5.0, 150.0).is_ok(), ok);
    }
}
