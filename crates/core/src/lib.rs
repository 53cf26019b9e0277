pub mod config;
pub mod domain;
pub mod errors;
pub mod reference;

pub use domain::agency::{AgencyMatch, AgencySearchQuery};
pub use domain::confirmation::{ConfirmationRequest, SOFT_CONFIRMATION_CONFIDENCE};
pub use domain::requirements::{
    Category, CompanySize, FieldName, Maturity, PrimaryGoal, Requirements, StrategyType,
    TimelineUrgency,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use reference::{industry_data, recognize_tools, IndustryData, ToolInfo};
