//! Neo4j store over the HTTP transactional endpoint.
//!
//! Requires the `neo4j` feature. Every lookup is one auto-commit transaction
//! (`POST {uri}/db/{database}/tx/commit`) with parameterised Cypher. Queries
//! return `labels(..)`, `properties(..)` and `type(r)` columns so rows map
//! directly onto [`GraphNode`] and [`GraphEdge`]; rows that do not are
//! logged and skipped.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{GraphError, GraphResult};
use crate::store::GraphStore;
use crate::types::{Direction, GraphEdge, GraphNode, LabelScope, NodeLabel};
use medkg_core::{PropertyMap, RelationType};

const FIND_DISEASE: &str = "MATCH (n:Disease {name: $name}) \
     RETURN labels(n) AS labels, properties(n) AS props LIMIT $limit";

const FIND_DOMAIN: &str = "MATCH (n {name: $name}) \
     WHERE any(label IN labels(n) WHERE label IN $labels) \
     RETURN labels(n) AS labels, properties(n) AS props LIMIT $limit";

const RELATION_TRIPLES: &str = "MATCH (s)-[r]->(t) WHERE s.name = $source \
     RETURN labels(s) AS sl, properties(s) AS sp, type(r) AS rel, labels(t) AS tl, properties(t) AS tp \
     LIMIT $limit \
     UNION \
     MATCH (s)-[r]->(t) WHERE t.name = $target \
     RETURN labels(s) AS sl, properties(s) AS sp, type(r) AS rel, labels(t) AS tl, properties(t) AS tp \
     LIMIT $limit";

const OUTGOING: &str = "MATCH (n)-[r]->(m) WHERE n.name = $name \
     AND any(label IN labels(m) WHERE label IN $labels) \
     RETURN labels(n) AS sl, properties(n) AS sp, type(r) AS rel, labels(m) AS tl, properties(m) AS tp \
     LIMIT $limit";

const INCOMING: &str = "MATCH (n)<-[r]-(m) WHERE n.name = $name \
     AND any(label IN labels(m) WHERE label IN $labels) \
     RETURN labels(m) AS sl, properties(m) AS sp, type(r) AS rel, labels(n) AS tl, properties(n) AS tp \
     LIMIT $limit";

/// Connection settings.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// HTTP base URI, e.g. `http://localhost:7474`.
    pub uri: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl Neo4jConfig {
    pub fn new(uri: &str, user: &str, password: &str) -> Self {
        Self {
            uri: uri.trim_end_matches('/').to_string(),
            database: "neo4j".to_string(),
            user: user.to_string(),
            password: password.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/db/{}/tx/commit", self.uri, self.database)
    }
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Read-only Neo4j client.
pub struct Neo4jHttpStore {
    config: Neo4jConfig,
    client: reqwest::blocking::Client,
}

impl Neo4jHttpStore {
    pub fn new(config: Neo4jConfig) -> GraphResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GraphError::ConnectionFailed(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Run one statement and return its rows.
    fn run(&self, statement: &str, parameters: Value) -> GraphResult<Vec<Vec<Value>>> {
        let body = json!({
            "statements": [{ "statement": statement, "parameters": parameters }]
        });

        let response = self
            .client
            .post(self.config.endpoint())
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&body)
            .send()
            .map_err(|e| GraphError::ConnectionFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().unwrap_or_default();
            return Err(match status {
                401 | 403 => GraphError::AuthenticationFailed(status),
                _ => GraphError::Http { status, body },
            });
        }

        let tx: TxResponse = response
            .json()
            .map_err(|e| GraphError::MalformedRecord(e.to_string()))?;

        if let Some(err) = tx.errors.into_iter().next() {
            return Err(GraphError::Query {
                code: err.code,
                message: err.message,
            });
        }

        let rows: Vec<Vec<Value>> = tx
            .results
            .into_iter()
            .flat_map(|r| r.data)
            .map(|d| d.row)
            .collect();
        debug!(rows = rows.len(), "Cypher statement finished");
        Ok(rows)
    }

    fn edges(&self, statement: &str, parameters: Value) -> GraphResult<Vec<GraphEdge>> {
        let rows = self.run(statement, parameters)?;
        Ok(rows
            .iter()
            .filter_map(|row| match parse_edge(row) {
                Ok(edge) => Some(edge),
                Err(e) => {
                    warn!("Skipping edge record: {}", e);
                    None
                }
            })
            .collect())
    }
}

fn domain_labels() -> Vec<&'static str> {
    NodeLabel::ALL.iter().map(|l| l.as_str()).collect()
}

fn parse_labels(value: &Value) -> GraphResult<Vec<String>> {
    serde_json::from_value(value.clone())
        .map_err(|e| GraphError::MalformedRecord(format!("labels: {}", e)))
}

fn parse_properties(value: &Value) -> GraphResult<PropertyMap> {
    serde_json::from_value(value.clone())
        .map_err(|e| GraphError::MalformedRecord(format!("properties: {}", e)))
}

fn parse_node(labels: &Value, properties: &Value) -> GraphResult<GraphNode> {
    GraphNode::from_record(&parse_labels(labels)?, parse_properties(properties)?)
}

/// `[labels, props, type, labels, props]` into an edge.
fn parse_edge(row: &[Value]) -> GraphResult<GraphEdge> {
    let [sl, sp, rel, tl, tp] = row else {
        return Err(GraphError::MalformedRecord(format!(
            "expected 5 columns, got {}",
            row.len()
        )));
    };
    let relation = rel
        .as_str()
        .map(RelationType::parse)
        .ok_or_else(|| GraphError::MalformedRecord("missing relationship type".into()))?;
    Ok(GraphEdge::new(
        parse_node(sl, sp)?,
        relation,
        parse_node(tl, tp)?,
    ))
}

impl GraphStore for Neo4jHttpStore {
    fn find_entities(
        &self,
        name: &str,
        scope: LabelScope,
        limit: usize,
    ) -> GraphResult<Vec<GraphNode>> {
        let rows = match scope {
            LabelScope::Disease => self.run(FIND_DISEASE, json!({ "name": name, "limit": limit }))?,
            LabelScope::Domain => self.run(
                FIND_DOMAIN,
                json!({ "name": name, "labels": domain_labels(), "limit": limit }),
            )?,
        };

        Ok(rows
            .iter()
            .filter_map(|row| {
                let parsed = match row.as_slice() {
                    [labels, props] => parse_node(labels, props),
                    _ => Err(GraphError::MalformedRecord(format!(
                        "expected 2 columns, got {}",
                        row.len()
                    ))),
                };
                parsed
                    .map_err(|e| warn!(entity = name, "Skipping node record: {}", e))
                    .ok()
            })
            .collect())
    }

    fn relation_triples(
        &self,
        source: &str,
        target: &str,
        limit: usize,
    ) -> GraphResult<Vec<GraphEdge>> {
        self.edges(
            RELATION_TRIPLES,
            json!({ "source": source, "target": target, "limit": limit }),
        )
    }

    fn neighbors(
        &self,
        name: &str,
        direction: Direction,
        limit: usize,
    ) -> GraphResult<Vec<GraphEdge>> {
        let statement = match direction {
            Direction::Outgoing => OUTGOING,
            Direction::Incoming => INCOMING,
        };
        self.edges(
            statement,
            json!({ "name": name, "labels": domain_labels(), "limit": limit }),
        )
    }

    fn health_check(&self) -> GraphResult<()> {
        self.run("RETURN 1", json!({})).map(|_| ())
    }
}
