pub mod activity_log;
pub mod assistance;
pub mod family;
pub mod individual;
pub mod members;
pub mod need;
