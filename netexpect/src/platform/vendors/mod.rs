//! Built-in vendor profiles.

pub mod cisco_ios;
pub mod generic;
pub mod juniper;
pub mod linux;
