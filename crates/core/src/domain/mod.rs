pub mod agency;
pub mod confirmation;
pub mod requirements;
