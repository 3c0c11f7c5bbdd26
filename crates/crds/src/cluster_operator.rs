//! ClusterOperator resource
//!
//! Cluster-scoped health report read by the cluster version tooling. The
//! operator owns exactly one instance and mutates only its status.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "ClusterOperator",
    plural = "clusteroperators",
    status = "ClusterOperatorStatus"
)]
pub struct ClusterOperatorSpec {}

/// Observed state reported by an operator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOperatorStatus {
    #[serde(default)]
    pub conditions: Vec<ClusterOperatorStatusCondition>,

    /// Operand versions, one entry per component name
    #[serde(default)]
    pub versions: Vec<OperandVersion>,

    /// Objects worth collecting when debugging this operator
    #[serde(default)]
    pub related_objects: Vec<ObjectReference>,
}

/// Condition type on a ClusterOperator.
///
/// The object is shared with other writers, so types this operator does not
/// set itself are kept as `Other` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClusterStatusConditionType {
    Available,
    Progressing,
    Degraded,
    Upgradeable,
    /// The operator's primary function has been switched off
    Disabled,
    Other(String),
}

impl ClusterStatusConditionType {
    /// All condition types, in the order they are seeded on a new object.
    pub const ALL: [ClusterStatusConditionType; 5] = [
        ClusterStatusConditionType::Available,
        ClusterStatusConditionType::Progressing,
        ClusterStatusConditionType::Degraded,
        ClusterStatusConditionType::Upgradeable,
        ClusterStatusConditionType::Disabled,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "Available",
            Self::Progressing => "Progressing",
            Self::Degraded => "Degraded",
            Self::Upgradeable => "Upgradeable",
            Self::Disabled => "Disabled",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for ClusterStatusConditionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Available" => Self::Available,
            "Progressing" => Self::Progressing,
            "Degraded" => Self::Degraded,
            "Upgradeable" => Self::Upgradeable,
            "Disabled" => Self::Disabled,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for ClusterStatusConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ClusterStatusConditionType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ClusterStatusConditionType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl JsonSchema for ClusterStatusConditionType {
    fn schema_name() -> Cow<'static, str> {
        "ClusterStatusConditionType".into()
    }

    fn inline_schema() -> bool {
        true
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        String::json_schema(generator)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value { ConditionStatus::True } else { ConditionStatus::False }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOperatorStatusCondition {
    #[serde(rename = "type")]
    pub type_: ClusterStatusConditionType,

    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,

    /// CamelCase machine-readable reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClusterOperatorStatusCondition {
    /// Builds a condition stamped with the current time. Empty reason or
    /// message strings are stored as absent.
    pub fn new(
        type_: ClusterStatusConditionType,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) -> Self {
        Self {
            type_,
            status,
            last_transition_time: Some(Utc::now()),
            reason: (!reason.is_empty()).then(|| reason.to_string()),
            message: (!message.is_empty()).then(|| message.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OperandVersion {
    pub name: String,
    pub version: String,
}

impl OperandVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into() }
    }
}

/// Reference to a related object, used by must-gather style tooling.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ObjectReference {
    pub group: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

impl ClusterOperatorStatus {
    /// Merges `condition` into the list by type.
    ///
    /// An existing entry of the same type has its status, reason, message and
    /// transition time replaced; a missing type is appended. Every other entry
    /// is left as it was.
    pub fn set_condition(&mut self, condition: ClusterOperatorStatusCondition) {
        match self.conditions.iter_mut().find(|c| c.type_ == condition.type_) {
            Some(existing) => {
                existing.status = condition.status;
                existing.reason = condition.reason;
                existing.message = condition.message;
                existing.last_transition_time = condition.last_transition_time;
            }
            None => self.conditions.push(condition),
        }
    }

    pub fn condition(&self, type_: ClusterStatusConditionType) -> Option<&ClusterOperatorStatusCondition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Upserts an operand version by name. Only the current value is kept.
    pub fn set_operand_version(&mut self, version: OperandVersion) {
        match self.versions.iter_mut().find(|v| v.name == version.name) {
            Some(existing) => existing.version = version.version,
            None => self.versions.push(version),
        }
    }

    pub fn operand_version(&self, name: &str) -> Option<&str> {
        self.versions
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.version.as_str())
    }
}
