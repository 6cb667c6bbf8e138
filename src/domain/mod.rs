//! Core domain types and logic.

pub mod error;
pub mod event;
pub mod symbol_events;
pub mod frequency;
pub mod quote;
pub mod aggregator;
pub mod lookbehind;
pub mod indicator;
pub mod position;
pub mod portfolio;
pub mod pnl;
pub mod simulation;
pub mod strategy;
pub mod config_validation;
