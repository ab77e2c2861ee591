//! Result alias and the early-return checks used by the segidx crates.
//!
//! Each check macro evaluates a condition and returns from the enclosing function
//! when it does not hold:
//!
//! - `verify_arg!(name, cond)` fails with `InvalidArgument` (caller input),
//! - `verify_data!(element, cond)` fails with `InvalidFormat` (a malformed encoded
//!   element, such as a column block),
//! - `verify_index!(cond, "fmt", args..)` fails with `CorruptIndex` (a persisted
//!   index that has to be rebuilt from its segment).

use crate::error::{Error, ErrorKind};

pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:ident, $cond:expr) => {
        if !$cond {
            return Err($crate::result::check_failed(
                $crate::result::Check::Argument,
                stringify!($name),
                stringify!($cond),
            ));
        }
    };
}

#[macro_export]
macro_rules! verify_data {
    ($element:ident, $cond:expr) => {
        if !$cond {
            return Err($crate::result::check_failed(
                $crate::result::Check::Data,
                stringify!($element),
                stringify!($cond),
            ));
        }
    };
}

#[macro_export]
macro_rules! verify_index {
    ($cond:expr, $($message:tt)+) => {
        if !$cond {
            return Err($crate::error::Error::corrupt_index(format!($($message)+)));
        }
    };
}

/// Kind of a failed check.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Argument,
    Data,
}

/// Builds the error of a failed `verify_arg!` or `verify_data!`.
#[doc(hidden)]
#[cold]
pub fn check_failed(check: Check, name: &str, condition: &str) -> Error {
    let message = format!("`{condition}` does not hold");
    match check {
        Check::Argument => ErrorKind::InvalidArgument {
            name: name.to_string(),
            message,
        },
        Check::Data => ErrorKind::InvalidFormat {
            element: name.to_string(),
            message,
        },
    }
    .into()
}
