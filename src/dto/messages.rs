use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{ContactMessage, Subscriber, UserMessage};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BroadcastMessageRequest {
    pub content: String,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMessageRequest {
    pub content: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    pub message_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub modified: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserMessageList {
    pub items: Vec<UserMessage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactMessageList {
    pub items: Vec<ContactMessage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriberList {
    pub items: Vec<Subscriber>,
}
