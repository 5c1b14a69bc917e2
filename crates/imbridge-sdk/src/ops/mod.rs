//! Typed wrappers, grouped by domain. Every method takes an optional
//! operation id; `None` gets a fresh one.

mod conversation;
mod friend;
mod group;
mod message;
mod user;
