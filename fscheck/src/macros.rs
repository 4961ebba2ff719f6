// SPDX-License-Identifier: MIT

/// Returns early with `$err.into()` unless `$cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// Returns early with `$err.into()`.
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($err.into());
    };
}
