// ============================================================================
// Session Infrastructure - Redis Session Backend
// File: crates/session-infrastructure/src/cache/redis_session_backend.rs
// ============================================================================
//! Shared session backend on Redis.
//!
//! Layout:
//! - `{prefix}session:{id}` holds the JSON record with a PX TTL equal to the
//!   remaining inactivity window.
//! - `{prefix}user_sessions:{subject}` is a set of session ids per subject.
//!   Members can outlive their records; they are pruned on enumeration.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use deadpool_redis::redis::{self, RedisError};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use tracing::{debug, info, warn};

use session_core::domain::{SessionId, SessionRecord};
use session_core::error::StoreError;
use session_core::repositories::SessionBackend;
use session_shared::config::RedisSettings;
use session_shared::constants::{SESSION_KEY_NAMESPACE, USER_SESSIONS_KEY_NAMESPACE};

/// Read-refresh-write of one record in a single server-side step.
///
/// KEYS[1] session key. ARGV: last_activity_at ms, expires_at ms, ttl ms,
/// subject index key prefix.
const TOUCH_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return false
end
local record = cjson.decode(raw)
record['last_activity_at'] = tonumber(ARGV[1])
record['expires_at'] = tonumber(ARGV[2])
local encoded = cjson.encode(record)
redis.call('SET', KEYS[1], encoded, 'PX', ARGV[3])
redis.call('PEXPIRE', ARGV[4] .. record['subject_id'], ARGV[3])
return encoded
"#;

pub fn create_redis_pool(settings: &RedisSettings) -> Result<Pool, StoreError> {
    let mut cfg = Config::from_url(settings.url.as_str());
    cfg.pool = Some(PoolConfig::new(settings.max_connections as usize));
    let pool = cfg
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| StoreError::Unavailable(format!("cannot create redis pool: {}", e)))?;
    info!(
        "Redis session pool created (max {} connections)",
        settings.max_connections
    );
    Ok(pool)
}

fn redis_error(e: RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn ttl_millis(ttl: Duration) -> i64 {
    ttl.num_milliseconds().max(1)
}

#[derive(Clone)]
pub struct RedisSessionBackend {
    pool: Pool,
    key_prefix: String,
}

impl RedisSessionBackend {
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    /// Round-trips a PING; used at startup and by the health probe.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        Ok(())
    }

    fn session_key(&self, session_id: &str) -> String {
        format!("{}{}{}", self.key_prefix, SESSION_KEY_NAMESPACE, session_id)
    }

    fn subject_index_prefix(&self) -> String {
        format!("{}{}", self.key_prefix, USER_SESSIONS_KEY_NAMESPACE)
    }

    fn subject_key(&self, subject_id: &str) -> String {
        format!("{}{}", self.subject_index_prefix(), subject_id)
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn decode(raw: Option<String>) -> Result<Option<SessionRecord>, StoreError> {
        Ok(raw.map(|raw| SessionRecord::from_json(&raw)).transpose()?)
    }
}

#[async_trait]
impl SessionBackend for RedisSessionBackend {
    async fn insert(&self, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        let payload = record.to_json()?;
        let ttl_ms = ttl_millis(ttl);
        let session_key = self.session_key(record.session_id.as_str());
        let subject_key = self.subject_key(&record.subject_id);

        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&session_key)
            .arg(&payload)
            .arg("PX")
            .arg(ttl_ms)
            .ignore()
            .cmd("SADD")
            .arg(&subject_key)
            .arg(record.session_id.as_str())
            .ignore()
            .cmd("PEXPIRE")
            .arg(&subject_key)
            .arg(ttl_ms)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(redis_error)?;

        debug!("Stored session {} in redis", record.session_id);
        Ok(())
    }

    async fn touch(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let expires_at = now + timeout;
        let mut conn = self.connection().await?;
        let raw: Option<String> = redis::cmd("EVAL")
            .arg(TOUCH_SCRIPT)
            .arg(1)
            .arg(self.session_key(session_id.as_str()))
            .arg(now.timestamp_millis())
            .arg(expires_at.timestamp_millis())
            .arg(ttl_millis(timeout))
            .arg(self.subject_index_prefix())
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;

        Self::decode(raw)
    }

    async fn get(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.session_key(session_id.as_str()))
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;

        // Redis TTL is authoritative, but never hand out a record our own clock
        // already considers expired.
        Ok(Self::decode(raw)?.filter(|record| !record.is_expired_at(now)))
    }

    async fn remove(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(self.session_key(session_id.as_str()))
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;

        let record = match Self::decode(raw) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                // The key is gone either way.
                warn!("Removed unreadable session {}: {}", session_id, e);
                return Ok(None);
            }
        };

        let index_cleanup: Result<(), RedisError> = redis::cmd("SREM")
            .arg(self.subject_key(&record.subject_id))
            .arg(session_id.as_str())
            .query_async(&mut conn)
            .await;
        if let Err(e) = index_cleanup {
            debug!("Index cleanup for session {} deferred: {}", session_id, e);
        }

        Ok(Some(record).filter(|record| !record.is_expired_at(now)))
    }

    async fn session_ids_for(
        &self,
        subject_id: &str,
        _now: DateTime<Utc>,
    ) -> Result<Vec<SessionId>, StoreError> {
        let subject_key = self.subject_key(subject_id);
        let mut conn = self.connection().await?;
        let members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(&subject_key)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for member in &members {
            pipe.cmd("EXISTS").arg(self.session_key(member));
        }
        let exists: Vec<bool> = pipe.query_async(&mut conn).await.map_err(redis_error)?;

        let (live, stale): (Vec<_>, Vec<_>) = members
            .into_iter()
            .zip(exists)
            .partition(|(_, exists)| *exists);
        let stale: Vec<String> = stale.into_iter().map(|(member, _)| member).collect();

        if !stale.is_empty() {
            debug!(
                "Pruning {} stale index entries for subject {}",
                stale.len(),
                subject_id
            );
            redis::cmd("SREM")
                .arg(&subject_key)
                .arg(&stale)
                .query_async::<()>(&mut conn)
                .await
                .map_err(redis_error)?;
        }

        Ok(live
            .into_iter()
            .map(|(member, _)| SessionId::new(member))
            .collect())
    }
}
