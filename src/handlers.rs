pub mod activity_logs;
pub mod families;
pub mod individuals;
pub mod intake;
pub mod needs;
