// src/macros.rs

//
// Logging macros
//
// logging feature enabled → tracing
// logging feature disabled → only log_error prints to stderr
//

#![allow(unused_macros)]

#[cfg(feature = "logging")]
mod imp {
    macro_rules! log_error {
        ($($arg:tt)*) => {
            tracing::error!($($arg)*)
        };
    }

    macro_rules! log_warn {
        ($($arg:tt)*) => {
            tracing::warn!($($arg)*)
        };
    }

    macro_rules! log_info {
        ($($arg:tt)*) => {
            tracing::info!($($arg)*)
        };
    }

    macro_rules! log_debug {
        ($($arg:tt)*) => {
            tracing::debug!($($arg)*)
        };
    }

    pub(crate) use log_debug;
    pub(crate) use log_error;
    pub(crate) use log_info;
    pub(crate) use log_warn;
}

#[cfg(not(feature = "logging"))]
mod imp {
    macro_rules! log_error {
        ($($arg:tt)*) => {
            eprintln!($($arg)*)
        };
    }

    macro_rules! log_warn {
        ($($arg:tt)*) => {};
    }

    macro_rules! log_info {
        ($($arg:tt)*) => {};
    }

    macro_rules! log_debug {
        ($($arg:tt)*) => {};
    }

    pub(crate) use log_debug;
    pub(crate) use log_error;
    pub(crate) use log_info;
    pub(crate) use log_warn;
}

pub(crate) use imp::{log_debug, log_error, log_info, log_warn};
