use crate::cassandra::Cassandra;
use crate::connection::Settings;
use crate::mongo::MongoDB;
use crate::neo::Neo4j;
use error::HospitalError;
use std::fmt::Display;
use tracing::info;

/// The stores a console session can open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Cassandra,
    MongoDB,
    Neo4j,
}

impl Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Cassandra => f.write_str("cassandra"),
            EngineKind::MongoDB => f.write_str("mongodb"),
            EngineKind::Neo4j => f.write_str("neo4j"),
        }
    }
}

pub enum Engine {
    Cassandra(Cassandra),
    MongoDB(MongoDB),
    Neo4j(Neo4j),
}

impl Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind().fmt(f)
    }
}

impl Engine {
    pub async fn connect(kind: EngineKind, settings: &Settings) -> Result<Engine, HospitalError> {
        info!("Connecting to {}...", kind);
        let engine = match kind {
            EngineKind::Cassandra => {
                Engine::Cassandra(Cassandra::connect(settings.cassandra.clone()).await?)
            }
            EngineKind::MongoDB => Engine::MongoDB(MongoDB::connect(settings.mongo.clone()).await?),
            EngineKind::Neo4j => Engine::Neo4j(Neo4j::connect(settings.neo4j.clone()).await?),
        };
        Ok(engine)
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            Engine::Cassandra(_) => EngineKind::Cassandra,
            Engine::MongoDB(_) => EngineKind::MongoDB,
            Engine::Neo4j(_) => EngineKind::Neo4j,
        }
    }

    /// Releases the connection; the engine is consumed.
    pub async fn stop(self) -> Result<(), HospitalError> {
        match self {
            Engine::Cassandra(c) => c.stop().await,
            Engine::MongoDB(m) => m.stop().await,
            Engine::Neo4j(n) => n.stop().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(EngineKind::Cassandra.to_string(), "cassandra");
        assert_eq!(EngineKind::MongoDB.to_string(), "mongodb");
        assert_eq!(EngineKind::Neo4j.to_string(), "neo4j");
    }

    #[tokio::test]
    #[ignore = "needs a running mongodb"]
    async fn test_connect_and_stop() {
        let settings = Settings::from_env().unwrap();

        let engine = Engine::connect(EngineKind::MongoDB, &settings).await.unwrap();
        assert_eq!(engine.kind(), EngineKind::MongoDB);
        assert_eq!(engine.to_string(), "mongodb");

        engine.stop().await.unwrap();
    }
}
