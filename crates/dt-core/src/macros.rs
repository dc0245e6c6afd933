/// Macro to return early with an error
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::generic(format!($($arg)*)))
    };
}

/// Return early with a categorized compiler error
#[macro_export]
macro_rules! compile_bail {
    ($category:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::compiler($category, format!($($arg)*)))
    };
}

/// Unwrap a `Resolution`, returning `Ok(Resolution::Pending)` from the enclosing function
/// when the value is not available yet.
#[macro_export]
macro_rules! resolved {
    ($resolution:expr) => {
        match $resolution {
            $crate::item::Resolution::Resolved(value) => value,
            $crate::item::Resolution::Pending => {
                return Ok($crate::item::Resolution::Pending);
            }
        }
    };
}

/// Log a warning message
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!($($arg)*)
    };
}

/// Log a debug message
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::tracing::debug!($($arg)*)
    };
}

/// Log an info message
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::tracing::info!($($arg)*)
    };
}

/// Log a trace message
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::tracing::trace!($($arg)*)
    };
}
