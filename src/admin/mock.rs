//! Recording In-Memory Administrative Double
//!
//! Stands in for the cluster's administrative gateways in tests. It keeps
//! the same idempotency semantics as the real boundary (first application is
//! `Applied`, re-application is `AlreadyApplied`), records every call in
//! order so tests can assert dependency ordering, and can be scripted to be
//! unreachable, to delay primary election, or to reject specific commands.

use crate::admin::client::{AdminApi, AdminError};
use crate::admin::protocol::{AdminAck, KeyPattern, MemberStatus, ReplicaSetStatus, ShardEntry};
use crate::plan::RangeKey;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Scriptable, order-recording implementation of [`AdminApi`].
#[derive(Default)]
pub struct RecordingAdmin {
    /// Ordered `"method target"` log of every call received.
    calls: Mutex<Vec<String>>,
    /// Effects already present in the simulated cluster, keyed canonically.
    applied: DashMap<String, ()>,
    /// Endpoints that fail every node-scoped command.
    unreachable: DashMap<String, ()>,
    /// Endpoints that fail this many pings before becoming reachable.
    flaky_pings: DashMap<String, AtomicU32>,
    /// Endpoints whose replica set withholds a primary for this many
    /// status polls after initiation.
    election_delays: DashMap<String, AtomicU32>,
    /// Canonical command keys forced to a fatal rejection.
    rejections: DashMap<String, (String, String)>,
}

impl RecordingAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordered call log, one `"method target"` entry per command.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Pre-marks an effect as present, as if a previous run applied it.
    pub fn mark_applied(&self, key: &str) {
        self.applied.insert(key.to_string(), ());
    }

    /// Makes every node-scoped command against `endpoint` fail.
    pub fn set_unreachable(&self, endpoint: &str) {
        self.unreachable.insert(endpoint.to_string(), ());
    }

    /// Fails the first `count` pings against `endpoint`, then recovers.
    pub fn fail_pings(&self, endpoint: &str, count: u32) {
        self.flaky_pings
            .insert(endpoint.to_string(), AtomicU32::new(count));
    }

    /// Withholds a primary for the first `polls` status calls after the
    /// replica set on `endpoint` is initiated.
    pub fn delay_election(&self, endpoint: &str, polls: u32) {
        self.election_delays
            .insert(endpoint.to_string(), AtomicU32::new(polls));
    }

    /// Forces the command identified by `key` to a fatal rejection.
    /// Pings use the key `ping:{endpoint}`.
    pub fn reject(&self, key: &str, code_name: &str, message: &str) {
        self.rejections
            .insert(key.to_string(), (code_name.to_string(), message.to_string()));
    }

    fn record(&self, method: &str, target: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", method, target));
    }

    fn check_reachable(&self, endpoint: &str) -> Result<(), AdminError> {
        if self.unreachable.contains_key(endpoint) {
            return Err(AdminError::Unreachable {
                endpoint: endpoint.to_string(),
                detail: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    /// Applies an idempotent effect: first time `Applied`, after that
    /// `AlreadyApplied`, unless the key is scripted to fail.
    fn apply(&self, key: String) -> Result<AdminAck, AdminError> {
        if let Some(entry) = self.rejections.get(&key) {
            let (code_name, message) = entry.value().clone();
            return Err(AdminError::Rejected {
                endpoint: "router".to_string(),
                code_name,
                message,
            });
        }
        if self.applied.insert(key, ()).is_some() {
            Ok(AdminAck::AlreadyApplied)
        } else {
            Ok(AdminAck::Applied)
        }
    }

    fn replica_set_key(endpoint: &str) -> String {
        format!("replset:{}", endpoint)
    }
}

#[async_trait]
impl AdminApi for RecordingAdmin {
    async fn ping(&self, endpoint: &str) -> Result<(), AdminError> {
        self.record("ping", endpoint);
        self.check_reachable(endpoint)?;
        if let Some(entry) = self.rejections.get(&format!("ping:{}", endpoint)) {
            let (code_name, message) = entry.value().clone();
            return Err(AdminError::Rejected {
                endpoint: endpoint.to_string(),
                code_name,
                message,
            });
        }
        if let Some(remaining) = self.flaky_pings.get(endpoint) {
            // fetch_update instead of a plain check so concurrent probes
            // cannot double-consume a failure budget entry.
            let failed = remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(AdminError::Unreachable {
                    endpoint: endpoint.to_string(),
                    detail: "still starting".to_string(),
                });
            }
        }
        Ok(())
    }

    async fn replica_set_initiate(
        &self,
        endpoint: &str,
        replica_set_id: &str,
        _members: &[String],
    ) -> Result<AdminAck, AdminError> {
        self.record("replica_set_initiate", replica_set_id);
        self.check_reachable(endpoint)?;
        self.apply(Self::replica_set_key(endpoint))
    }

    async fn replica_set_status(&self, endpoint: &str) -> Result<ReplicaSetStatus, AdminError> {
        self.record("replica_set_status", endpoint);
        self.check_reachable(endpoint)?;

        if !self.applied.contains_key(&Self::replica_set_key(endpoint)) {
            return Ok(ReplicaSetStatus::default());
        }
        if let Some(delay) = self.election_delays.get(endpoint) {
            let still_electing = delay
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if still_electing {
                return Ok(ReplicaSetStatus {
                    members: vec![MemberStatus {
                        name: endpoint.to_string(),
                        state: "STARTUP".to_string(),
                    }],
                });
            }
        }
        Ok(ReplicaSetStatus {
            members: vec![MemberStatus {
                name: endpoint.to_string(),
                state: "PRIMARY".to_string(),
            }],
        })
    }

    async fn add_shard(&self, connection_string: &str) -> Result<AdminAck, AdminError> {
        self.record("add_shard", connection_string);
        self.apply(format!("shard:{}", connection_string))
    }

    async fn list_shards(&self) -> Result<Vec<ShardEntry>, AdminError> {
        self.record("list_shards", "router");
        let mut shards: Vec<ShardEntry> = self
            .applied
            .iter()
            .filter_map(|entry| {
                let key = entry.key();
                let connection_string = key.strip_prefix("shard:")?;
                let (id, host) = connection_string.split_once('/')?;
                Some(ShardEntry {
                    id: id.to_string(),
                    host: host.to_string(),
                    zones: Vec::new(),
                })
            })
            .collect();
        shards.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(shards)
    }

    async fn enable_sharding(&self, database: &str) -> Result<AdminAck, AdminError> {
        self.record("enable_sharding", database);
        self.apply(format!("database:{}", database))
    }

    async fn shard_collection(
        &self,
        namespace: &str,
        _key: &KeyPattern,
    ) -> Result<AdminAck, AdminError> {
        self.record("shard_collection", namespace);
        self.apply(format!("collection:{}", namespace))
    }

    async fn add_shard_to_zone(&self, shard: &str, zone: &str) -> Result<AdminAck, AdminError> {
        self.record("add_shard_to_zone", &format!("{}->{}", shard, zone));
        self.apply(format!("tag:{}:{}", shard, zone))
    }

    async fn update_zone_key_range(
        &self,
        namespace: &str,
        min: &RangeKey,
        max: &RangeKey,
        zone: &str,
    ) -> Result<AdminAck, AdminError> {
        self.record(
            "update_zone_key_range",
            &format!("{} [{} .. {}) -> {}", namespace, min, max, zone),
        );
        self.apply(format!("range:{}:{}:{}:{}", namespace, min, max, zone))
    }

    async fn create_index(
        &self,
        namespace: &str,
        name: &str,
        _key: &KeyPattern,
        unique: bool,
    ) -> Result<AdminAck, AdminError> {
        self.record("create_index", &format!("{}.{}", namespace, name));
        self.apply(format!("index:{}:{}:{}", namespace, name, unique))
    }
}
