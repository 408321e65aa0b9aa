// utils/debug.rs
//! Debugging utilities
//! Everything defined here is only active whenever `debug_assertions` are enabled

#[cfg(debug_assertions)]
pub fn __unravel(e: &impl std::error::Error) {
    let mut source = e.source();
    while let Some(e) = source {
        tracing::error!("    Caused by: {e}");
        source = e.source();
    }
}

/// # Logs the chain of sources behind an error
///
/// The error itself is expected to have been logged already
#[macro_export]
macro_rules! unravel {
    ($e: expr) => {
        #[cfg(debug_assertions)]
        {
            $crate::utils::debug::__unravel(&$e);
        }
    };
}
