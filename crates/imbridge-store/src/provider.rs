use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::LocalStore;

/// Supplies the identifiers a per-target migration step fans out over.
///
/// Returns the list serialized as a JSON array of strings, the form the
/// native unit reports it in.
pub trait TargetProvider: Send + Sync {
    fn target_ids<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + Send + 'a>>;
}

/// Reads conversation ids straight from `local_conversations`.
pub struct StoreConversationIds {
    store: Arc<LocalStore>,
}

impl StoreConversationIds {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }
}

impl TargetProvider for StoreConversationIds {
    fn target_ids<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let ids = self.store.conversation_ids()?;
            Ok(serde_json::to_string(&ids)?)
        })
    }
}

/// A fixed list of targets.
#[derive(Debug, Clone, Default)]
pub struct StaticTargets {
    ids: Vec<String>,
}

impl StaticTargets {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl TargetProvider for StaticTargets {
    fn target_ids<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + Send + 'a>> {
        Box::pin(async move { Ok(serde_json::to_string(&self.ids)?) })
    }
}

/// Decode a serialized id list. `None` if it is not a JSON array of strings.
pub fn parse_target_ids(raw: &str) -> Option<Vec<String>> {
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_targets_serialize_as_json_list() {
        let provider = StaticTargets::new(["c1", "c2"]);
        assert_eq!(provider.target_ids().await.unwrap(), r#"["c1","c2"]"#);
    }

    #[tokio::test]
    async fn store_provider_reads_conversations() {
        let store = Arc::new(LocalStore::open_in_memory().unwrap());
        store
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TABLE local_conversations (conversation_id text);
                     INSERT INTO local_conversations VALUES ('sg_g1');",
                )?;
                Ok(())
            })
            .unwrap();

        let provider = StoreConversationIds::new(store);
        let raw = provider.target_ids().await.unwrap();
        assert_eq!(parse_target_ids(&raw), Some(vec!["sg_g1".to_string()]));
    }

    #[test]
    fn parse_rejects_non_lists() {
        assert_eq!(parse_target_ids("not json"), None);
        assert_eq!(parse_target_ids(r#"{"a":1}"#), None);
        assert_eq!(parse_target_ids("[1,2]"), None);
        assert_eq!(parse_target_ids("[]"), Some(vec![]));
    }
}
