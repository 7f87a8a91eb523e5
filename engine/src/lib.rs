pub mod batch;
pub mod cassandra;
pub mod catalog;
pub mod connection;
pub mod engine;
pub mod model;
pub mod mongo;
pub mod neo;
pub mod sample;
pub mod shaper;

pub use cassandra::{Cassandra, PopulateSummary};
pub use connection::Settings;
pub use engine::{Engine, EngineKind};
pub use mongo::MongoDB;
pub use neo::{GraphQuery, Neo4j};
pub use shaper::{HeartRateStats, Thresholds};
