use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A filter rule to install on the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Rule {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tag: None,
        }
    }
}

/// A rule as reported by the service, with its server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActiveRule {
    pub id: String,
    pub value: String,
    pub tag: Option<String>,
}

/// Body of `GET /2/tweets/search/stream/rules`.
///
/// `data` is absent when no rules exist. A `data` field that isn't an array of
/// rules is treated the same as an absent one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesResponse {
    #[serde(default, deserialize_with = "lenient_rules")]
    pub data: Option<Vec<ActiveRule>>,
    #[serde(default)]
    pub meta: Option<RulesMeta>,
}

impl RulesResponse {
    pub fn ids(&self) -> Vec<String> {
        self.data
            .iter()
            .flatten()
            .map(|rule| rule.id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.data.as_ref().map_or(true, |rules| rules.is_empty())
    }
}

fn lenient_rules<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<ActiveRule>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesMeta {
    pub sent: Option<String>,
    pub result_count: Option<u64>,
    pub summary: Option<RulesSummary>,
}

/// Counts reported after an add or delete request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesSummary {
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub not_created: u64,
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub not_deleted: u64,
    #[serde(default)]
    pub valid: u64,
    #[serde(default)]
    pub invalid: u64,
}

/// Body of `POST /2/tweets/search/stream/rules` for both add and delete.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesMutationResponse {
    #[serde(default, deserialize_with = "lenient_rules")]
    pub data: Option<Vec<ActiveRule>>,
    #[serde(default)]
    pub meta: Option<RulesMeta>,
    #[serde(default)]
    pub errors: Vec<Value>,
}

impl RulesMutationResponse {
    pub fn summary(&self) -> RulesSummary {
        self.meta
            .as_ref()
            .and_then(|m| m.summary.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AddRulesRequest<'a> {
    pub add: &'a [Rule],
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeleteRulesRequest<'a> {
    pub delete: DeleteIds<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeleteIds<'a> {
    pub ids: &'a [String],
}

/// One decoded object from the filtered stream.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamEvent {
    #[serde(default)]
    pub data: Option<Post>,
    /// Operational messages the stream sends in place of a post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamEvent {
    /// Post text, if the event carries one.
    pub fn text(&self) -> Option<&str> {
        self.data.as_ref()?.text.as_deref()
    }

    pub fn post_id(&self) -> Option<&str> {
        self.data.as_ref()?.id.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Post {
    pub id: Option<String>,
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
