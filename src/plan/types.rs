use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// One independently-replicated partition of the data store.
///
/// The `replica_set_id` doubles as the shard's registered name: the routing
/// layer identifies the shard by its replica set, and the connection string
/// used for registration is `replica_set_id/host:port`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardSpec {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub replica_set_id: String,
}

impl ShardSpec {
    /// `host:port` of the shard's administrative endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection string the routing layer expects for registration.
    pub fn connection_string(&self) -> String {
        format!("{}/{}:{}", self.replica_set_id, self.host, self.port)
    }
}

/// The partition-key shape assigned to a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartitionKey {
    /// Single field, hashed. Spreads write load evenly; no range locality.
    Hashed { field: String },
    /// Single field, range-ordered. Keeps range scans on one shard.
    Range { field: String },
    /// Multiple range-ordered fields. The leading field carries the routing
    /// value (e.g. a location), the trailing field is a uniqueness tiebreaker.
    Compound { fields: Vec<String> },
}

impl PartitionKey {
    /// The key fields in declaration order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            PartitionKey::Hashed { field } | PartitionKey::Range { field } => {
                vec![field.as_str()]
            }
            PartitionKey::Compound { fields } => fields.iter().map(|f| f.as_str()).collect(),
        }
    }
}

/// A secondary index declaration, applied after the collection is sharded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSpec {
    pub fields: Vec<IndexField>,
    #[serde(default)]
    pub unique: bool,
}

/// One field of a secondary index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexField {
    pub name: String,
    #[serde(default)]
    pub descending: bool,
}

impl IndexSpec {
    /// Human-readable index name, e.g. `email_1` or `brand_1_model_1`.
    pub fn index_name(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}_{}", f.name, if f.descending { "-1" } else { "1" }))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// A collection to be partitioned, with its key shape and indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    pub key: PartitionKey,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

/// A named zone grouping one or more shards.
///
/// Key ranges are bound to the zone label; the routing layer then directs
/// documents in those ranges to the zone's member shards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    pub member_shards: Vec<String>,
}

/// One endpoint component of a key range.
///
/// `Min` sorts below every concrete value and `Max` above, so open-ended
/// ranges need no magic sentinel strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeyBound {
    Min,
    Value(String),
    Max,
}

impl PartialOrd for KeyBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyBound {
    fn cmp(&self, other: &Self) -> Ordering {
        use KeyBound::*;
        match (self, other) {
            (Min, Min) | (Max, Max) => Ordering::Equal,
            (Min, _) | (_, Max) => Ordering::Less,
            (_, Min) | (Max, _) => Ordering::Greater,
            (Value(a), Value(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for KeyBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyBound::Min => write!(f, "MinKey"),
            KeyBound::Max => write!(f, "MaxKey"),
            KeyBound::Value(v) => write!(f, "{:?}", v),
        }
    }
}

/// A point in the key space of a (possibly compound) partition key.
///
/// One bound per key field, compared lexicographically, so
/// `("HANOI", Min) < ("HANOI", Max) < ("HUE", Min)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RangeKey(pub Vec<KeyBound>);

impl RangeKey {
    /// The lowest point of an n-field key space.
    pub fn min(arity: usize) -> Self {
        RangeKey(vec![KeyBound::Min; arity])
    }

    /// The highest point of an n-field key space.
    pub fn max(arity: usize) -> Self {
        RangeKey(vec![KeyBound::Max; arity])
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, bound) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", bound)?;
        }
        write!(f, ")")
    }
}

/// A contiguous `[min, max)` interval of a collection's key space, bound to
/// a zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangeAssignment {
    pub collection: String,
    pub zone: String,
    pub min: RangeKey,
    pub max: RangeKey,
}

impl RangeAssignment {
    /// Half-open interval overlap: `new.min < existing.max && existing.min <
    /// new.max`. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &RangeAssignment) -> bool {
        self.collection == other.collection && self.min < other.max && other.min < self.max
    }
}

impl fmt::Display for RangeAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} .. {}) -> {}",
            self.collection, self.min, self.max, self.zone
        )
    }
}

/// The immutable input of a bootstrap run.
///
/// Loaded once, validated, then only read. The orchestrator derives all of
/// its work units from this structure; runtime progress lives in the
/// cluster's own configuration metadata, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyPlan {
    /// Logical database holding every partitioned collection.
    pub database: String,
    pub shards: Vec<ShardSpec>,
    pub collections: Vec<CollectionSpec>,
    pub zones: Vec<ZoneSpec>,
    pub ranges: Vec<RangeAssignment>,
}

impl TopologyPlan {
    /// Loads and validates a plan from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let plan: TopologyPlan = serde_json::from_str(&raw)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Fully-qualified `database.collection` namespace.
    pub fn namespace(&self, collection: &str) -> String {
        format!("{}.{}", self.database, collection)
    }

    pub fn shard(&self, name: &str) -> Option<&ShardSpec> {
        self.shards.iter().find(|s| s.name == name)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Range assignments for one collection, ordered by lower bound.
    pub fn ranges_for(&self, collection: &str) -> Vec<&RangeAssignment> {
        let mut ranges: Vec<&RangeAssignment> = self
            .ranges
            .iter()
            .filter(|r| r.collection == collection)
            .collect();
        ranges.sort_by(|a, b| a.min.cmp(&b.min));
        ranges
    }
}
