pub mod consistency;
pub mod document;
pub mod property;
pub mod search;
pub mod step;
pub mod suggestion;
