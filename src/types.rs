use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// GitHub search API response structures. Records are taken as delivered:
// a missing, null or mistyped field falls back to its default instead of
// rejecting the page.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub owner: RepositoryOwner,
    pub stargazers_count: u64,
    pub language: Option<String>,
}

impl Repository {
    /// Build a repository from an arbitrary JSON record, field by field
    pub fn from_record(record: &Value) -> Self {
        Self {
            id: field(record, "id"),
            name: field(record, "name"),
            description: field(record, "description"),
            html_url: field(record, "html_url"),
            owner: record
                .get("owner")
                .map(RepositoryOwner::from_record)
                .unwrap_or_default(),
            stargazers_count: field(record, "stargazers_count"),
            language: field(record, "language"),
        }
    }

    /// Language label as shown in the list, `N/A` when GitHub reports none.
    pub fn language_label(&self) -> &str {
        self.language.as_deref().unwrap_or("N/A")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryOwner {
    pub login: String,
    pub avatar_url: String,
}

impl RepositoryOwner {
    pub fn from_record(record: &Value) -> Self {
        Self {
            login: field(record, "login"),
            avatar_url: field(record, "avatar_url"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(deserialize_with = "lenient_items")]
    pub items: Vec<Repository>,
}

fn field<T: DeserializeOwned + Default>(record: &Value, key: &str) -> T {
    record
        .get(key)
        .and_then(|value| T::deserialize(value).ok())
        .unwrap_or_default()
}

// `items` itself must be a list; its elements may be anything
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<Repository>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = Vec::<Value>::deserialize(deserializer)?;
    Ok(records.iter().map(Repository::from_record).collect())
}
