//! Database row types — these map directly to SQLite rows.
//! Distinct from the filmcrew-types API models to keep the DB layer
//! independent; ids and timestamps stay as TEXT until the API layer
//! converts them.

pub struct ProfileRow {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub headline: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_key: Option<String>,
    pub created_at: String,
}

pub struct ConnectionRow {
    pub id: String,
    pub requester_id: String,
    pub addressee_id: String,
    pub status: String,
    pub created_at: String,
    pub responded_at: Option<String>,
}

pub struct ConversationRow {
    pub id: String,
    pub user_low: String,
    pub user_high: String,
    pub created_at: String,
}

impl ConversationRow {
    /// The participant that is not `user_id`, if `user_id` is a participant.
    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        if self.user_low == user_id {
            Some(&self.user_high)
        } else if self.user_high == user_id {
            Some(&self.user_low)
        } else {
            None
        }
    }
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: String,
    pub read_at: Option<String>,
}

pub struct CompanyRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
}

pub struct MemberRow {
    pub company_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: String,
}

pub struct InvitationRow {
    pub id: String,
    pub company_id: String,
    pub invitee_id: String,
    pub inviter_id: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
    pub responded_at: Option<String>,
}

pub struct ProductionRow {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub logline: Option<String>,
    pub status: String,
    pub starts_on: Option<String>,
    pub wraps_on: Option<String>,
    pub created_at: String,
}

/// Job post joined with its production and company for listings.
pub struct JobRow {
    pub id: String,
    pub production_id: String,
    pub production_title: String,
    pub company_id: String,
    pub company_name: String,
    pub title: String,
    pub department: String,
    pub description: Option<String>,
    pub rate: Option<String>,
    pub status: String,
    pub created_at: String,
}

pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub job_title: String,
    pub applicant_id: String,
    pub note: Option<String>,
    pub status: String,
    pub created_at: String,
    pub responded_at: Option<String>,
}
