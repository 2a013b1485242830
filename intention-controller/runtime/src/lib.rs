#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use intention_controller_core as core;
pub use intention_controller_index as index;

mod args;
mod evaluate;
mod log;

pub use self::{
    args::{Args, Service},
    evaluate::Query,
    log::LogFormat,
};
