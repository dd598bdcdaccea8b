use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    ApplicationStatus, CompanyRole, ConnectionStatus, Conversation, JobApplication, Message,
    ProductionStatus, Profile,
};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the WebSocket gateway.
/// Canonical definition lives here to avoid duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MagicLinkRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MagicLinkResponse {
    pub status: &'static str,
    /// Only present when the server is configured to echo tokens (dev mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub token: String,
}

// -- Profiles --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub headline: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

// -- Connections --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionRequestBody {
    pub addressee_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionListQuery {
    pub status: Option<ConnectionStatus>,
}

// -- Companies --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCompanyRequest {
    pub name: String,
    /// Explicit slug; derived from the name when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlugCheckQuery {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SlugCheckResponse {
    /// The candidate slug derived from the supplied name.
    pub slug: String,
    pub available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InviteRequest {
    pub invitee_id: Uuid,
    pub role: CompanyRole,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferOwnershipRequest {
    pub new_owner_id: Uuid,
}

// -- Productions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductionRequest {
    pub title: String,
    pub logline: Option<String>,
    pub status: Option<ProductionStatus>,
    pub starts_on: Option<String>,
    pub wraps_on: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductionRequest {
    pub title: Option<String>,
    pub logline: Option<String>,
    pub status: Option<ProductionStatus>,
    pub starts_on: Option<String>,
    pub wraps_on: Option<String>,
}

// -- Jobs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    pub title: String,
    pub department: String,
    pub description: Option<String>,
    pub rate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub department: Option<String>,
    pub status: Option<crate::models::JobStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyRequest {
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationDecisionRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Serialize)]
pub struct JobApplicationWithProfile {
    #[serde(flatten)]
    pub application: JobApplication,
    pub applicant: Profile,
}

// -- Messaging --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartConversationRequest {
    pub other_user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StartConversationResponse {
    #[serde(flatten)]
    pub conversation: Conversation,
    /// False when the pair already shared a conversation.
    pub created: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    /// Ids of the messages whose read timestamp was set by this call.
    pub message_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}
