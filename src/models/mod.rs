//! # Data Models
//!
//! This module contains the SeaORM entities and status vocabularies used
//! throughout the jobmarket backend.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod account;
pub mod conversation;
pub mod conversation_member;
pub mod job;
pub mod job_approval_log;
pub mod job_approval_request;
pub mod job_category;
pub mod job_location;
pub mod job_skill;
pub mod job_working_time;
pub mod message;
pub mod message_attachment;
pub mod status;

pub use account::Entity as Account;
pub use conversation::Entity as Conversation;
pub use conversation_member::Entity as ConversationMember;
pub use job::Entity as Job;
pub use job_approval_log::Entity as JobApprovalLog;
pub use job_approval_request::Entity as JobApprovalRequest;
pub use message::Entity as Message;
pub use message_attachment::Entity as MessageAttachment;
pub use status::{AccountType, ApprovalStatus, ConversationType, JobStatus, LogStatus, MessageType};

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "jobmarket".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
