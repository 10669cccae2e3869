// GraphQL-over-HTTP character source — one POST per query document.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::traits::{Character, CharacterPage, CharacterSource, Criteria};
use crate::config::EngineConfig;

const PAGE_QUERY: &str = "\
query Characters($page: Int, $name: String, $status: String, $species: String, $gender: String, $limit: Int) {
  characters(page: $page, name: $name, status: $status, species: $species, gender: $gender, limit: $limit) {
    info { count pages next prev }
    results { id name status species gender image origin { name } }
  }
}";

const BY_ID_QUERY: &str = "\
query CharacterById($id: ID!) {
  character(id: $id) {
    id name status species gender image origin { name }
  }
}";

pub struct GraphqlSource {
    client: Client,
    endpoint: String,
    page_size: u32,
}

impl GraphqlSource {
    pub fn new(endpoint: String, page_size: u32) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            page_size,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.endpoint.clone(), config.page_size)
    }

    /// Execute one query document and return the `data` payload.
    ///
    /// A non-empty `errors` list is a failure; messages are joined for
    /// display.
    async fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!("graphql request failed status={}", status.as_u16());
            return Err(anyhow!("graphql request failed: HTTP {}", status.as_u16()));
        }

        let body: Value = resp.json().await?;
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let joined = errors
                    .iter()
                    .map(|e| {
                        e.get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error")
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                warn!("graphql query returned errors: {}", joined);
                return Err(anyhow!(joined));
            }
        }

        body.get("data")
            .filter(|data| !data.is_null())
            .cloned()
            .ok_or_else(|| anyhow!("graphql response has no data payload"))
    }

    /// Build page query variables, omitting filter fields that are unset.
    fn page_variables(&self, criteria: &Criteria, page: u32) -> Value {
        let mut vars = Map::new();
        vars.insert("page".into(), json!(page));
        vars.insert("limit".into(), json!(self.page_size));
        for (key, value) in [
            ("name", &criteria.name),
            ("status", &criteria.status),
            ("species", &criteria.species),
            ("gender", &criteria.gender),
        ] {
            if !value.is_empty() {
                vars.insert(key.into(), json!(value));
            }
        }
        Value::Object(vars)
    }
}

#[async_trait]
impl CharacterSource for GraphqlSource {
    async fn fetch_page(&self, criteria: &Criteria, page: u32) -> Result<CharacterPage> {
        let variables = self.page_variables(criteria, page);
        let data = self.execute(PAGE_QUERY, variables).await?;
        let payload = data
            .get("characters")
            .cloned()
            .ok_or_else(|| anyhow!("graphql response has no characters payload"))?;
        let page: CharacterPage = serde_json::from_value(payload)?;
        debug!(
            "fetched page with {} results, next={:?}",
            page.results.len(),
            page.info.next
        );
        Ok(page)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Character>> {
        let data = self.execute(BY_ID_QUERY, json!({ "id": id })).await?;
        match data.get("character") {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_variables_omit_unset_filters() {
        let source = GraphqlSource::new("http://unused/graphql".to_string(), 15);
        let criteria = Criteria {
            status: "alive".to_string(),
            ..Criteria::default()
        };

        let vars = source.page_variables(&criteria, 3);
        assert_eq!(vars["page"], json!(3));
        assert_eq!(vars["limit"], json!(15));
        assert_eq!(vars["status"], json!("alive"));
        assert!(vars.get("name").is_none());
        assert!(vars.get("species").is_none());
        assert!(vars.get("gender").is_none());
    }

    #[test]
    fn test_from_config_uses_configured_page_size() {
        let source = GraphqlSource::from_config(&EngineConfig::default());
        let vars = source.page_variables(&Criteria::default(), 1);
        assert_eq!(vars["limit"], json!(crate::config::PAGE_SIZE));
    }

    #[test]
    fn test_page_variables_full_criteria() {
        let source = GraphqlSource::new("http://unused/graphql".to_string(), 20);
        let criteria = Criteria {
            name: "rick".to_string(),
            status: "alive".to_string(),
            species: "human".to_string(),
            gender: "male".to_string(),
        };

        let vars = source.page_variables(&criteria, 1);
        assert_eq!(vars["name"], json!("rick"));
        assert_eq!(vars["status"], json!("alive"));
        assert_eq!(vars["species"], json!("human"));
        assert_eq!(vars["gender"], json!("male"));
    }
}
