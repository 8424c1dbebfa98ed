pub mod commission;
pub mod factors;
pub mod policy;
pub mod schedule;
