//! lead-desk-core: role-gated back office for insurance leads.
//!
//! Entry point is `desk::LeadDesk`. Only `store` talks to SQLite.

pub mod cache;
pub mod clock;
pub mod command;
pub mod commission;
pub mod config;
pub mod demo;
pub mod desk;
pub mod error;
pub mod event;
pub mod identity;
pub mod lead;
pub mod name_generator;
pub mod rng;
pub mod role;
pub mod status;
pub mod store;
pub mod types;
pub mod view;
pub mod visibility;
