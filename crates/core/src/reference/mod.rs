//! Read-only lookup tables shared by every session.

pub mod industries;
pub mod tools;

pub use industries::{industry_data, IndustryData};
pub use tools::{recognize_tools, ToolInfo};
