use crate::admin::protocol::{
    ALREADY_APPLIED_CODES, AdminAck, AdminCommand, CommandResponse, ENDPOINT_COMMAND, KeyPattern,
    ReplicaSetStatus, ShardEntry,
};
use crate::plan::RangeKey;
use async_trait::async_trait;
use thiserror::Error;

/// Classified failure of an administrative command.
///
/// `Unreachable` is the transient case (node not up yet) and is the only
/// variant callers may retry. `Rejected` covers fatal remote errors (malformed
/// command, permission denied) which retrying cannot fix.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("endpoint {endpoint} unreachable: {detail}")]
    Unreachable { endpoint: String, detail: String },
    #[error("command rejected by {endpoint}: {code_name}: {message}")]
    Rejected {
        endpoint: String,
        code_name: String,
        message: String,
    },
}

impl AdminError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AdminError::Unreachable { .. })
    }
}

/// The administrative command surface of the cluster.
///
/// One method per command the orchestrator issues. Implementations classify
/// responses: success-equivalent idempotency conflicts come back as
/// `AdminAck::AlreadyApplied`, everything else as an [`AdminError`].
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Liveness probe against a single node's administrative endpoint.
    async fn ping(&self, endpoint: &str) -> Result<(), AdminError>;

    /// Form a replica set on the target node with the given member list.
    async fn replica_set_initiate(
        &self,
        endpoint: &str,
        replica_set_id: &str,
        members: &[String],
    ) -> Result<AdminAck, AdminError>;

    /// Read back replica-set member states from the target node.
    async fn replica_set_status(&self, endpoint: &str) -> Result<ReplicaSetStatus, AdminError>;

    /// Register a replica set with the routing layer. Issued to the router.
    async fn add_shard(&self, connection_string: &str) -> Result<AdminAck, AdminError>;

    /// Enumerate shards registered with the routing layer.
    async fn list_shards(&self) -> Result<Vec<ShardEntry>, AdminError>;

    /// Allow collections of a database to be partitioned.
    async fn enable_sharding(&self, database: &str) -> Result<AdminAck, AdminError>;

    /// Assign a partition key to a namespace.
    async fn shard_collection(
        &self,
        namespace: &str,
        key: &KeyPattern,
    ) -> Result<AdminAck, AdminError>;

    /// Tag a shard with a zone label.
    async fn add_shard_to_zone(&self, shard: &str, zone: &str) -> Result<AdminAck, AdminError>;

    /// Bind a `[min, max)` key range of a namespace to a zone.
    async fn update_zone_key_range(
        &self,
        namespace: &str,
        min: &RangeKey,
        max: &RangeKey,
        zone: &str,
    ) -> Result<AdminAck, AdminError>;

    /// Create a secondary index on a namespace.
    async fn create_index(
        &self,
        namespace: &str,
        name: &str,
        key: &KeyPattern,
        unique: bool,
    ) -> Result<AdminAck, AdminError>;
}

/// `AdminApi` implementation speaking JSON over HTTP to the cluster's
/// administrative gateways.
///
/// Router-scoped commands (add-shard, sharding and zone configuration) go to
/// the routing layer's gateway; node-scoped commands (ping, replica-set
/// initiate/status) go straight to the target node.
pub struct HttpAdminClient {
    router_endpoint: String,
    http_client: reqwest::Client,
}

impl HttpAdminClient {
    pub fn new(router_endpoint: impl Into<String>) -> Self {
        Self {
            router_endpoint: router_endpoint.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// POSTs a command envelope to one node's gateway and decodes the
    /// uniform response envelope.
    async fn send(
        &self,
        endpoint: &str,
        command: &AdminCommand,
    ) -> Result<CommandResponse, AdminError> {
        let url = format!("http://{}{}", endpoint, ENDPOINT_COMMAND);
        tracing::debug!("Sending {:?} to {}", command, url);

        let response = self
            .http_client
            .post(&url)
            .json(command)
            .send()
            .await
            .map_err(|e| AdminError::Unreachable {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })?;

        response
            .json::<CommandResponse>()
            .await
            .map_err(|e| AdminError::Rejected {
                endpoint: endpoint.to_string(),
                code_name: "MalformedResponse".to_string(),
                message: e.to_string(),
            })
    }

    /// Maps the response envelope into the three-way outcome.
    fn classify(endpoint: &str, response: CommandResponse) -> Result<AdminAck, AdminError> {
        if response.ok {
            return Ok(AdminAck::Applied);
        }

        let code_name = response.code_name.unwrap_or_default();
        if ALREADY_APPLIED_CODES.contains(&code_name.as_str()) {
            return Ok(AdminAck::AlreadyApplied);
        }

        Err(AdminError::Rejected {
            endpoint: endpoint.to_string(),
            code_name,
            message: response.errmsg.unwrap_or_default(),
        })
    }

    async fn send_router(&self, command: AdminCommand) -> Result<AdminAck, AdminError> {
        let response = self.send(&self.router_endpoint, &command).await?;
        Self::classify(&self.router_endpoint, response)
    }
}

#[async_trait]
impl AdminApi for HttpAdminClient {
    async fn ping(&self, endpoint: &str) -> Result<(), AdminError> {
        let response = self.send(endpoint, &AdminCommand::Ping).await?;
        Self::classify(endpoint, response).map(|_| ())
    }

    async fn replica_set_initiate(
        &self,
        endpoint: &str,
        replica_set_id: &str,
        members: &[String],
    ) -> Result<AdminAck, AdminError> {
        let command = AdminCommand::ReplSetInitiate {
            replica_set_id: replica_set_id.to_string(),
            members: members.to_vec(),
        };
        let response = self.send(endpoint, &command).await?;
        Self::classify(endpoint, response)
    }

    async fn replica_set_status(&self, endpoint: &str) -> Result<ReplicaSetStatus, AdminError> {
        let response = self.send(endpoint, &AdminCommand::ReplSetGetStatus).await?;
        if !response.ok {
            return Self::classify(endpoint, response).map(|_| ReplicaSetStatus::default());
        }
        Ok(response.replica_set.unwrap_or_default())
    }

    async fn add_shard(&self, connection_string: &str) -> Result<AdminAck, AdminError> {
        self.send_router(AdminCommand::AddShard {
            connection_string: connection_string.to_string(),
        })
        .await
    }

    async fn list_shards(&self) -> Result<Vec<ShardEntry>, AdminError> {
        let response = self
            .send(&self.router_endpoint, &AdminCommand::ListShards)
            .await?;
        if !response.ok {
            return Self::classify(&self.router_endpoint, response).map(|_| Vec::new());
        }
        Ok(response.shards.unwrap_or_default())
    }

    async fn enable_sharding(&self, database: &str) -> Result<AdminAck, AdminError> {
        self.send_router(AdminCommand::EnableSharding {
            database: database.to_string(),
        })
        .await
    }

    async fn shard_collection(
        &self,
        namespace: &str,
        key: &KeyPattern,
    ) -> Result<AdminAck, AdminError> {
        self.send_router(AdminCommand::ShardCollection {
            namespace: namespace.to_string(),
            key: key.clone(),
        })
        .await
    }

    async fn add_shard_to_zone(&self, shard: &str, zone: &str) -> Result<AdminAck, AdminError> {
        self.send_router(AdminCommand::AddShardToZone {
            shard: shard.to_string(),
            zone: zone.to_string(),
        })
        .await
    }

    async fn update_zone_key_range(
        &self,
        namespace: &str,
        min: &RangeKey,
        max: &RangeKey,
        zone: &str,
    ) -> Result<AdminAck, AdminError> {
        self.send_router(AdminCommand::UpdateZoneKeyRange {
            namespace: namespace.to_string(),
            min: min.clone(),
            max: max.clone(),
            zone: zone.to_string(),
        })
        .await
    }

    async fn create_index(
        &self,
        namespace: &str,
        name: &str,
        key: &KeyPattern,
        unique: bool,
    ) -> Result<AdminAck, AdminError> {
        self.send_router(AdminCommand::CreateIndex {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.clone(),
            unique,
        })
        .await
    }
}
