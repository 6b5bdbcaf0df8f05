pub mod inventory;
pub mod serve;
pub mod stats;
pub mod status;
