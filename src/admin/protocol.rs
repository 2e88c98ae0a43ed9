//! Administrative Wire Protocol
//!
//! Defines the command envelope and Data Transfer Objects exchanged with the
//! cluster's HTTP administrative gateway. Commands are serialized as JSON and
//! POSTed to a single command endpoint on the target node; responses carry an
//! `ok` flag plus an optional `code_name` that drives the idempotency
//! classification in `client`.

use crate::plan::{IndexSpec, PartitionKey, RangeKey};
use serde::{Deserialize, Serialize};

/// Command endpoint exposed by every node's administrative gateway.
pub const ENDPOINT_COMMAND: &str = "/admin/command";

/// Positive outcome of an administrative command.
///
/// `AlreadyApplied` means the cluster reported the command's effect as
/// already present (replica set already initialized, shard already
/// registered, namespace already sharded, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAck {
    Applied,
    AlreadyApplied,
}

/// One field of a partition-key or index key pattern, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPart {
    pub field: String,
    pub kind: KeyPartKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyPartKind {
    Ascending,
    Descending,
    Hashed,
}

/// An ordered key pattern. Order matters for compound keys, which is why
/// this is a sequence and not a map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPattern(pub Vec<KeyPart>);

impl KeyPattern {
    /// The wire shape of a plan-declared partition key.
    pub fn from_partition_key(key: &PartitionKey) -> Self {
        match key {
            PartitionKey::Hashed { field } => KeyPattern(vec![KeyPart {
                field: field.clone(),
                kind: KeyPartKind::Hashed,
            }]),
            PartitionKey::Range { field } => KeyPattern(vec![KeyPart {
                field: field.clone(),
                kind: KeyPartKind::Ascending,
            }]),
            PartitionKey::Compound { fields } => KeyPattern(
                fields
                    .iter()
                    .map(|field| KeyPart {
                        field: field.clone(),
                        kind: KeyPartKind::Ascending,
                    })
                    .collect(),
            ),
        }
    }

    /// The wire shape of a secondary index declaration.
    pub fn from_index(index: &IndexSpec) -> Self {
        KeyPattern(
            index
                .fields
                .iter()
                .map(|f| KeyPart {
                    field: f.name.clone(),
                    kind: if f.descending {
                        KeyPartKind::Descending
                    } else {
                        KeyPartKind::Ascending
                    },
                })
                .collect(),
        )
    }
}

/// The tagged command envelope POSTed to [`ENDPOINT_COMMAND`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum AdminCommand {
    /// Lightweight liveness check.
    Ping,
    /// Form a replica set from the given member list. One-time per set.
    ReplSetInitiate {
        replica_set_id: String,
        members: Vec<String>,
    },
    /// Read back replica-set member states (primary election progress).
    ReplSetGetStatus,
    /// Register a replica set with the routing layer as a shard.
    AddShard { connection_string: String },
    /// Enumerate shards currently registered with the routing layer.
    ListShards,
    /// Allow collections of this database to be partitioned.
    EnableSharding { database: String },
    /// Assign a partition key to a namespace.
    ShardCollection { namespace: String, key: KeyPattern },
    /// Tag a shard with a zone label.
    AddShardToZone { shard: String, zone: String },
    /// Bind a `[min, max)` key range of a namespace to a zone.
    UpdateZoneKeyRange {
        namespace: String,
        min: RangeKey,
        max: RangeKey,
        zone: String,
    },
    /// Create a secondary index on a namespace.
    CreateIndex {
        namespace: String,
        name: String,
        key: KeyPattern,
        unique: bool,
    },
}

/// State of one replica-set member as reported by the cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberStatus {
    pub name: String,
    /// `PRIMARY`, `SECONDARY`, `STARTUP`, ... mirrored verbatim from the
    /// storage engine's status output.
    pub state: String,
}

/// Replica-set status read-back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicaSetStatus {
    #[serde(default)]
    pub members: Vec<MemberStatus>,
}

impl ReplicaSetStatus {
    /// Whether any member has won the primary election.
    pub fn has_primary(&self) -> bool {
        self.members.iter().any(|m| m.state == "PRIMARY")
    }
}

/// One shard as reported by `ListShards`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardEntry {
    pub id: String,
    pub host: String,
    #[serde(default)]
    pub zones: Vec<String>,
}

/// Uniform response envelope of the administrative gateway.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandResponse {
    pub ok: bool,
    /// Symbolic failure code, e.g. `AlreadyInitialized`, `ShardAlreadyExists`.
    #[serde(default)]
    pub code_name: Option<String>,
    #[serde(default)]
    pub errmsg: Option<String>,
    /// Payload of `ReplSetGetStatus`.
    #[serde(default)]
    pub replica_set: Option<ReplicaSetStatus>,
    /// Payload of `ListShards`.
    #[serde(default)]
    pub shards: Option<Vec<ShardEntry>>,
}

/// Code names the gateway uses for effects that were already in place.
/// Any of these turns a failed command into [`AdminAck::AlreadyApplied`].
pub const ALREADY_APPLIED_CODES: &[&str] = &[
    "AlreadyInitialized",
    "ShardAlreadyExists",
    "AlreadyEnabled",
    "NamespaceExists",
    "ZoneAlreadyTagged",
    "ZoneRangeExists",
    "IndexExists",
];
