//! Status vocabularies shared by the approval workflow and the chat subsystem.
//!
//! All enums are exchanged as lowercase strings on the wire and stored as
//! lowercase text columns. The approval log uses a single [`LogStatus`]
//! vocabulary covering the union of job-lifecycle statuses and approval
//! outcomes, so `previous_status`/`new_status` rows are uniform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Error returned when a stored status string is outside its vocabulary.
#[derive(Debug, Error)]
#[error("unknown {vocabulary} value: {value}")]
pub struct UnknownStatus {
    pub vocabulary: &'static str,
    pub value: String,
}

/// Lifecycle status of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Published,
    Rejected,
    Expired,
    Draft,
    Banned,
    Stopped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Published => "published",
            JobStatus::Rejected => "rejected",
            JobStatus::Expired => "expired",
            JobStatus::Draft => "draft",
            JobStatus::Banned => "banned",
            JobStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "published" => Ok(JobStatus::Published),
            "rejected" => Ok(JobStatus::Rejected),
            "expired" => Ok(JobStatus::Expired),
            "draft" => Ok(JobStatus::Draft),
            "banned" => Ok(JobStatus::Banned),
            "stopped" => Ok(JobStatus::Stopped),
            other => Err(UnknownStatus {
                vocabulary: "job status",
                value: other.to_string(),
            }),
        }
    }
}

/// Status of a job approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Stopped,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            "stopped" => Ok(ApprovalStatus::Stopped),
            other => Err(UnknownStatus {
                vocabulary: "approval status",
                value: other.to_string(),
            }),
        }
    }
}

/// Union vocabulary for approval-log `previous_status`/`new_status` columns.
///
/// `previous_status` carries the job's lifecycle status before the transition,
/// `new_status` carries the requested approval outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Pending,
    Published,
    Rejected,
    Expired,
    Draft,
    Banned,
    Stopped,
    Approved,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Pending => "pending",
            LogStatus::Published => "published",
            LogStatus::Rejected => "rejected",
            LogStatus::Expired => "expired",
            LogStatus::Draft => "draft",
            LogStatus::Banned => "banned",
            LogStatus::Stopped => "stopped",
            LogStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<JobStatus> for LogStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => LogStatus::Pending,
            JobStatus::Published => LogStatus::Published,
            JobStatus::Rejected => LogStatus::Rejected,
            JobStatus::Expired => LogStatus::Expired,
            JobStatus::Draft => LogStatus::Draft,
            JobStatus::Banned => LogStatus::Banned,
            JobStatus::Stopped => LogStatus::Stopped,
        }
    }
}

impl From<ApprovalStatus> for LogStatus {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Pending => LogStatus::Pending,
            ApprovalStatus::Approved => LogStatus::Approved,
            ApprovalStatus::Rejected => LogStatus::Rejected,
            ApprovalStatus::Stopped => LogStatus::Stopped,
        }
    }
}

/// Whether an account belongs to a job seeker or a business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Normal,
    Business,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Normal => "normal",
            AccountType::Business => "business",
        }
    }
}

impl FromStr for AccountType {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(AccountType::Normal),
            "business" => Ok(AccountType::Business),
            other => Err(UnknownStatus {
                vocabulary: "account type",
                value: other.to_string(),
            }),
        }
    }
}

/// Conversation shape: two-party private thread or business-initiated group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConversationType {
    Private,
    Group,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Private => "private",
            ConversationType::Group => "group",
        }
    }
}

impl FromStr for ConversationType {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(ConversationType::Private),
            "group" => Ok(ConversationType::Group),
            other => Err(UnknownStatus {
                vocabulary: "conversation type",
                value: other.to_string(),
            }),
        }
    }
}

/// Persisted message type. One row carries either text, a bundle of image
/// attachments, or a single file attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    File,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::File => "file",
        }
    }
}

impl FromStr for MessageType {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            "file" => Ok(MessageType::File),
            other => Err(UnknownStatus {
                vocabulary: "message type",
                value: other.to_string(),
            }),
        }
    }
}
