#![allow(
    clippy::float_cmp,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]

pub mod aggregate;
pub mod broker;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod durable;
pub mod error;
pub mod reaper;
pub mod staging;
pub mod warehouse;
pub mod worker;
