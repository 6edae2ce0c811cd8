//! Monte Carlo pricing of football corner-kick markets.
//! Estimates each side's expected corner count from historical rates, team strengths and recent
//! form, simulates the match outcome distribution and quotes 1X2, Asian handicap, total and
//! individual total markets on a fixed grid of bookmaker prices.

#![allow(clippy::too_many_arguments)]

pub mod calc;
pub mod config;
pub mod csv;
pub mod data;
pub mod file;
pub mod form;
pub mod grid;
pub mod market;
pub mod mc;
pub mod opt;
pub mod poisson;
pub mod print;
pub mod probs;
pub mod profile;
pub mod rate;
pub mod timed;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
