use config::{Config, Environment};
use error::HospitalError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

const DEFAULT_CQL_PORT: u16 = 9042;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CassandraConnection {
    pub cluster_ips: String,
    pub keyspace: String,
    pub replication_factor: u32,
    pub local_dc: String,
}

impl CassandraConnection {
    /// Contact points, with the default CQL port appended where none is given.
    pub fn nodes(&self) -> Vec<String> {
        self.cluster_ips
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(|ip| {
                if ip.contains(':') {
                    ip.to_string()
                } else {
                    format!("{}:{}", ip, DEFAULT_CQL_PORT)
                }
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MongoConnection {
    pub uri: String,
    pub database: String,
    pub server_selection_timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Neo4jConnection {
    pub uri: String,
    pub user: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub cassandra: CassandraConnection,
    pub mongo: MongoConnection,
    pub neo4j: Neo4jConnection,
}

impl Settings {
    pub fn from_env() -> Result<Settings, HospitalError> {
        Settings::load(None)
    }

    /// Reads the settings from `vars` instead of the process environment when given.
    pub fn load(vars: Option<HashMap<String, String>>) -> Result<Settings, HospitalError> {
        Ok(Settings {
            cassandra: section(
                "CASSANDRA",
                &[
                    ("cluster_ips", "127.0.0.1"),
                    ("keyspace", "cassandra_project"),
                    ("replication_factor", "1"),
                    ("local_dc", "datacenter1"),
                ],
                vars.clone(),
            )?,
            mongo: section(
                "MONGO",
                &[
                    ("uri", "mongodb://localhost:27017/"),
                    ("database", "Hospital"),
                    ("server_selection_timeout_ms", "5000"),
                ],
                vars.clone(),
            )?,
            neo4j: section(
                "NEO4J",
                &[
                    ("uri", "127.0.0.1:7687"),
                    ("user", "neo4j"),
                    ("password", "neo4j"),
                ],
                vars,
            )?,
        })
    }
}

fn section<T: DeserializeOwned>(
    prefix: &str,
    defaults: &[(&str, &str)],
    vars: Option<HashMap<String, String>>,
) -> Result<T, HospitalError> {
    let mut builder = Config::builder();
    for (key, value) in defaults {
        builder = builder
            .set_default(*key, *value)
            .map_err(HospitalError::config)?;
    }

    builder
        .add_source(Environment::with_prefix(prefix).source(vars))
        .build()
        .map_err(HospitalError::config)?
        .try_deserialize::<T>()
        .map_err(HospitalError::config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load(vars(&[])).unwrap();

        assert_eq!(settings.cassandra.cluster_ips, "127.0.0.1");
        assert_eq!(settings.cassandra.keyspace, "cassandra_project");
        assert_eq!(settings.cassandra.replication_factor, 1);
        assert_eq!(settings.cassandra.local_dc, "datacenter1");
        assert_eq!(settings.mongo.database, "Hospital");
        assert_eq!(settings.mongo.server_selection_timeout_ms, 5000);
        assert_eq!(settings.neo4j.user, "neo4j");
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::load(vars(&[
            ("CASSANDRA_CLUSTER_IPS", "10.0.0.1,10.0.0.2"),
            ("CASSANDRA_KEYSPACE", "vitals"),
            ("CASSANDRA_REPLICATION_FACTOR", "3"),
            ("MONGO_URI", "mongodb://db:27017/"),
            ("NEO4J_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(settings.cassandra.keyspace, "vitals");
        assert_eq!(settings.cassandra.replication_factor, 3);
        assert_eq!(
            settings.cassandra.nodes(),
            vec!["10.0.0.1:9042".to_string(), "10.0.0.2:9042".to_string()]
        );
        assert_eq!(settings.mongo.uri, "mongodb://db:27017/");
        assert_eq!(settings.neo4j.password, "secret");
    }

    #[test]
    fn test_invalid_replication_factor() {
        let res = Settings::load(vars(&[("CASSANDRA_REPLICATION_FACTOR", "three")]));
        assert!(matches!(res, Err(HospitalError::Config(_))));
    }

    #[test]
    fn test_nodes_keep_explicit_port() {
        let connection = CassandraConnection {
            cluster_ips: " 127.0.0.1:19042 , ,node-b".to_string(),
            keyspace: "ks".to_string(),
            replication_factor: 1,
            local_dc: "datacenter1".to_string(),
        };

        assert_eq!(
            connection.nodes(),
            vec!["127.0.0.1:19042".to_string(), "node-b:9042".to_string()]
        );
    }
}
