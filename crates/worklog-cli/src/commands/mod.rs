pub mod export;
pub mod project;
pub mod report;
pub mod session;
pub mod timezone;
