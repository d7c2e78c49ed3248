use std::sync::Arc;

use sd_datastore::{Datastore, DatastoreError, SettingsRecord};
use tracing::{debug, instrument};

use crate::errors::{Result, StoreError};
use crate::session::{HeaderSet, SessionSummary, header};

/// Settings namespace holding the cached session
pub const SESSION_NAMESPACE: &str = "store";

/// Settings key holding the cached session
pub const SESSION_KEY: &str = "headers";

/// Headers that never leave the cache through a summary
const SECRET_HEADERS: [&str; 3] = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];

/// Serialize a header set into the cached payload
pub fn encode_headers(headers: &HeaderSet) -> serde_json::Result<String> {
    serde_json::to_string(headers)
}

/// Parse a cached payload back into a header set
pub fn decode_headers(payload: &str) -> serde_json::Result<HeaderSet> {
    serde_json::from_str(payload)
}

// serde_json messages can quote the offending input, which may be a token
fn describe_decode_error(e: &serde_json::Error) -> String {
    format!(
        "payload is not a header map ({:?} error at line {} column {})",
        e.classify(),
        e.line(),
        e.column()
    )
}

const MACAROON_SCHEME: &str = "macaroon ";

// Authorization schemes are case-insensitive
fn carries_macaroon(value: &str) -> bool {
    value
        .trim_start()
        .get(..MACAROON_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(MACAROON_SCHEME))
}

/// Redacted projection of a cached header set
///
/// Drops the authorization and content negotiation headers (in any letter
/// case) and anything carrying a macaroon, then stamps the record's own
/// created/modified times.
pub fn summarize(headers: HeaderSet, record: &SettingsRecord) -> SessionSummary {
    let mut entries = headers.into_inner();
    entries.retain(|name, value| {
        !SECRET_HEADERS.iter().any(|s| name.eq_ignore_ascii_case(s))
            && !carries_macaroon(value)
    });

    entries.insert(header::CREATED.to_string(), record.created.to_string());
    entries.insert(header::MODIFIED.to_string(), record.modified.to_string());

    SessionSummary::from_map(entries)
}

/// The single cached store session, kept as one settings record
///
/// Every write replaces the record; there is no history and no expiry.
#[derive(Clone)]
pub struct SessionCache {
    datastore: Arc<dyn Datastore>,
}

impl SessionCache {
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        Self { datastore }
    }

    /// Store `headers`, overwriting any previous session
    #[instrument(skip_all)]
    pub async fn persist(&self, headers: &HeaderSet) -> Result<()> {
        let payload = encode_headers(headers).map_err(|e| StoreError::Persistence(e.into()))?;

        self.datastore
            .settings_put(SESSION_NAMESPACE, SESSION_KEY, &payload)
            .await
            .map_err(StoreError::Persistence)?;

        debug!("Cached store session ({} headers)", headers.len());
        Ok(())
    }

    /// Read the cached header set for use in requests
    #[instrument(skip_all)]
    pub async fn load_live(&self) -> Result<HeaderSet> {
        let (headers, _) = self.load().await?;
        Ok(headers)
    }

    /// Read the cached session with all secret material removed
    #[instrument(skip_all)]
    pub async fn load_summary(&self) -> Result<SessionSummary> {
        let (headers, record) = self.load().await?;
        Ok(summarize(headers, &record))
    }

    async fn load(&self) -> Result<(HeaderSet, SettingsRecord)> {
        let record = self
            .datastore
            .settings_get(SESSION_NAMESPACE, SESSION_KEY)
            .await
            .map_err(|e| match e {
                DatastoreError::NotFound { .. } => StoreError::NoSession,
                e => StoreError::CorruptSession {
                    reason: e.to_string(),
                },
            })?;

        let headers = decode_headers(&record.data).map_err(|e| StoreError::CorruptSession {
            reason: describe_decode_error(&e),
        })?;

        Ok((headers, record))
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("namespace", &SESSION_NAMESPACE)
            .field("key", &SESSION_KEY)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::TokenPair;
    use crate::headers::assemble;
    use sd_datastore::MemoryDatastore;

    fn cache() -> (SessionCache, MemoryDatastore) {
        let store = MemoryDatastore::new();
        (SessionCache::new(Arc::new(store.clone())), store)
    }

    fn assembled() -> HeaderSet {
        let tokens = TokenPair::new("M1", vec!["D1".to_string()]);
        assemble(&tokens, "store1", "16", "stable").unwrap()
    }

    #[tokio::test]
    async fn test_persist_then_load_live_is_lossless() {
        let (cache, _) = cache();
        let headers = assembled();

        cache.persist(&headers).await.unwrap();
        assert_eq!(cache.load_live().await.unwrap(), headers);
    }

    #[tokio::test]
    async fn test_persist_overwrites() {
        let (cache, store) = cache();
        cache.persist(&assembled()).await.unwrap();

        let other = assemble(&TokenPair::new("M2", vec![]), "store2", "18", "stable").unwrap();
        cache.persist(&other).await.unwrap();

        assert_eq!(cache.load_live().await.unwrap(), other);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_summary_is_redacted() {
        let (cache, _) = cache();
        cache.persist(&assembled()).await.unwrap();

        let summary = cache.load_summary().await.unwrap();
        let keys: Vec<&str> = summary.keys().collect();
        assert_eq!(
            keys,
            vec![
                "Created",
                "Modified",
                "Snap-Device-Channel",
                "Snap-Device-Series",
                "Snap-Device-Store",
            ]
        );
        assert_eq!(summary.get("Snap-Device-Store"), Some("store1"));
    }

    #[tokio::test]
    async fn test_summary_timestamps_come_from_record() {
        let (cache, store) = cache();
        cache.persist(&assembled()).await.unwrap();
        let record = store.settings_get(SESSION_NAMESPACE, SESSION_KEY).await.unwrap();

        let summary = cache.load_summary().await.unwrap();
        assert_eq!(summary.get("Created"), Some(record.created.to_string().as_str()));
        assert_eq!(summary.get("Modified"), Some(record.modified.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_summary_drops_secret_headers_in_any_case() {
        let (cache, store) = cache();
        store
            .settings_put(
                SESSION_NAMESPACE,
                SESSION_KEY,
                r#"{"authorization":"Macaroon root=\"m\"","ACCEPT":"application/json","X-Copy":"Macaroon root=\"m\"","X-Upper":"MACAROON root=\"m\"","X-Lower":"  macaroon root=\"m\"","Snap-Device-Series":"16","Created":"forged"}"#,
            )
            .await
            .unwrap();

        let summary = cache.load_summary().await.unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.get("Snap-Device-Series"), Some("16"));
        assert_ne!(summary.get("Created"), Some("forged"));
        assert!(summary.keys().all(|k| !k.eq_ignore_ascii_case("authorization")));
        assert!(!summary.contains("X-Upper"));
        assert!(!summary.contains("X-Lower"));
    }

    #[test]
    fn test_carries_macaroon() {
        assert!(carries_macaroon("Macaroon root=\"m\""));
        assert!(carries_macaroon("MACAROON root=\"m\""));
        assert!(carries_macaroon(" maCaroon x"));
        assert!(!carries_macaroon("Macaroon"));
        assert!(!carries_macaroon("Bearer abc"));
        // multi-byte input must not panic on the prefix slice
        assert!(!carries_macaroon("Macaro\u{e9}n x"));
    }

    #[tokio::test]
    async fn test_missing_record_is_no_session() {
        let (cache, _) = cache();
        assert!(matches!(cache.load_live().await, Err(StoreError::NoSession)));
        assert!(matches!(cache.load_summary().await, Err(StoreError::NoSession)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_corrupt_and_does_not_echo_it() {
        let (cache, store) = cache();
        for payload in [
            "not json",
            r#""Macaroon root=\"leaked\"""#,
            r#"{"Authorization": ["Macaroon root=\"leaked\""]}"#,
            "null",
        ] {
            store
                .settings_put(SESSION_NAMESPACE, SESSION_KEY, payload)
                .await
                .unwrap();

            match cache.load_summary().await {
                Err(StoreError::CorruptSession { reason }) => {
                    assert!(!reason.contains("leaked"), "{reason}");
                }
                other => panic!("expected CorruptSession for {payload}, got {other:?}"),
            }
            assert!(matches!(
                cache.load_live().await,
                Err(StoreError::CorruptSession { .. })
            ));
        }
    }

    #[test]
    fn test_decode_accepts_plain_json_object() {
        let headers = decode_headers(r#"{"Accept":"application/json","Snap-Device-Series":"16"}"#).unwrap();
        assert_eq!(headers.get("Snap-Device-Series"), Some("16"));
        assert!(!headers.is_authenticated());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        /// Header names as they occur in cached payloads, secret ones included in any case
        fn header_name() -> impl Strategy<Value = String> {
            prop_oneof![
                "[A-Za-z][A-Za-z0-9-]{0,20}",
                Just("Authorization".to_string()),
                Just("authorization".to_string()),
                Just("CONTENT-TYPE".to_string()),
                Just("Accept".to_string()),
            ]
        }

        fn header_value() -> impl Strategy<Value = String> {
            prop_oneof![
                any::<String>(),
                "(Macaroon|MACAROON|macaroon) root=\"[A-Za-z0-9_-]{1,16}\"",
            ]
        }

        fn header_set() -> impl Strategy<Value = HeaderSet> {
            prop::collection::btree_map(header_name(), header_value(), 0..8).prop_map(|map| {
                let mut headers = HeaderSet::new();
                for (name, value) in map {
                    headers.insert(&name, value);
                }
                headers
            })
        }

        fn record_for(payload: &str) -> SettingsRecord {
            SettingsRecord::replacing(None, SESSION_NAMESPACE, SESSION_KEY, payload)
        }

        proptest! {
            /// Property: encoding then decoding returns the same header set
            #[test]
            fn prop_encode_decode_is_lossless(headers in header_set()) {
                let payload = encode_headers(&headers).unwrap();
                prop_assert_eq!(decode_headers(&payload).unwrap(), headers);
            }

            /// Property: a summary never carries secret headers or a macaroon value
            #[test]
            fn prop_summary_never_leaks(headers in header_set()) {
                let payload = encode_headers(&headers).unwrap();
                let summary = summarize(decode_headers(&payload).unwrap(), &record_for(&payload));

                let entries: BTreeMap<String, String> = summary.into_map();
                for (name, value) in &entries {
                    prop_assert!(!SECRET_HEADERS.iter().any(|s| name.eq_ignore_ascii_case(s)));
                    prop_assert!(!carries_macaroon(value));
                }
                prop_assert!(entries.contains_key(header::CREATED));
                prop_assert!(entries.contains_key(header::MODIFIED));
            }
        }
    }
}
