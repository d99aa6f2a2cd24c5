pub mod gateway;
pub use gateway::{Filter, GatewayError, PersistenceGateway, Query, Table, Write};
pub mod pg_gateway;
pub use pg_gateway::PgGateway;

#[cfg(test)]
pub mod memory_gateway;
#[cfg(test)]
pub use memory_gateway::MemoryGateway;
