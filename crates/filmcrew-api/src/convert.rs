//! Row-to-model conversion. SQLite hands back TEXT ids and timestamps;
//! corrupt values degrade to defaults with a warning rather than failing
//! the whole request.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use filmcrew_db::models::{
    ApplicationRow, CompanyRow, ConnectionRow, ConversationRow, InvitationRow, JobRow, MemberRow,
    MessageRow, ProductionRow, ProfileRow,
};
use filmcrew_types::models::{
    ApplicationStatus, Company, CompanyInvitation, CompanyMember, CompanyRole, Connection,
    ConnectionStatus, Conversation, InvitationStatus, JobApplication, JobPost, JobStatus, Message,
    Production, ProductionStatus, Profile,
};

pub(crate) fn parse_id(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", raw, context, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

pub(crate) fn profile(row: ProfileRow) -> Profile {
    let avatar_url = row
        .avatar_key
        .as_ref()
        .map(|_| format!("/avatars/{}", row.id));

    Profile {
        id: parse_id(&row.id, "profile"),
        email: row.email,
        display_name: row.display_name,
        headline: row.headline,
        department: row.department,
        location: row.location,
        bio: row.bio,
        avatar_url,
        created_at: parse_timestamp(&row.created_at, "profile"),
    }
}

pub(crate) fn connection(row: ConnectionRow, other: ProfileRow) -> Connection {
    Connection {
        id: parse_id(&row.id, "connection"),
        requester_id: parse_id(&row.requester_id, "connection"),
        addressee_id: parse_id(&row.addressee_id, "connection"),
        status: ConnectionStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt status '{}' on connection '{}'", row.status, row.id);
            ConnectionStatus::Pending
        }),
        created_at: parse_timestamp(&row.created_at, "connection"),
        other: profile(other),
    }
}

pub(crate) fn conversation(row: &ConversationRow) -> Conversation {
    Conversation {
        id: parse_id(&row.id, "conversation"),
        created_at: parse_timestamp(&row.created_at, "conversation"),
    }
}

pub(crate) fn message(row: MessageRow) -> Message {
    Message {
        id: parse_id(&row.id, "message"),
        conversation_id: parse_id(&row.conversation_id, "message"),
        sender_id: parse_id(&row.sender_id, "message"),
        body: row.body,
        created_at: parse_timestamp(&row.created_at, "message"),
        read_at: row.read_at.as_deref().map(|ts| parse_timestamp(ts, "message")),
    }
}

pub(crate) fn company(row: CompanyRow) -> Company {
    Company {
        id: parse_id(&row.id, "company"),
        name: row.name,
        slug: row.slug,
        description: row.description,
        website: row.website,
        created_at: parse_timestamp(&row.created_at, "company"),
    }
}

pub(crate) fn member(row: MemberRow, profile_row: ProfileRow) -> CompanyMember {
    CompanyMember {
        role: CompanyRole::parse(&row.role).unwrap_or_else(|| {
            warn!("Corrupt role '{}' on company '{}'", row.role, row.company_id);
            CompanyRole::Member
        }),
        joined_at: parse_timestamp(&row.joined_at, "member"),
        profile: profile(profile_row),
    }
}

pub(crate) fn invitation(row: InvitationRow, company_row: CompanyRow) -> CompanyInvitation {
    CompanyInvitation {
        id: parse_id(&row.id, "invitation"),
        company: company(company_row),
        invitee_id: parse_id(&row.invitee_id, "invitation"),
        inviter_id: parse_id(&row.inviter_id, "invitation"),
        role: CompanyRole::parse(&row.role).unwrap_or_else(|| {
            warn!("Corrupt role '{}' on invitation '{}'", row.role, row.id);
            CompanyRole::Member
        }),
        status: InvitationStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt status '{}' on invitation '{}'", row.status, row.id);
            InvitationStatus::Pending
        }),
        created_at: parse_timestamp(&row.created_at, "invitation"),
    }
}

pub(crate) fn production(row: ProductionRow) -> Production {
    Production {
        id: parse_id(&row.id, "production"),
        company_id: parse_id(&row.company_id, "production"),
        title: row.title,
        logline: row.logline,
        status: ProductionStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt status '{}' on production '{}'", row.status, row.id);
            ProductionStatus::Development
        }),
        starts_on: row.starts_on,
        wraps_on: row.wraps_on,
        created_at: parse_timestamp(&row.created_at, "production"),
    }
}

pub(crate) fn job(row: JobRow) -> JobPost {
    JobPost {
        id: parse_id(&row.id, "job"),
        production_id: parse_id(&row.production_id, "job"),
        production_title: row.production_title,
        company_id: parse_id(&row.company_id, "job"),
        company_name: row.company_name,
        title: row.title,
        department: row.department,
        description: row.description,
        rate: row.rate,
        status: JobStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt status '{}' on job '{}'", row.status, row.id);
            JobStatus::Open
        }),
        created_at: parse_timestamp(&row.created_at, "job"),
    }
}

pub(crate) fn application(row: ApplicationRow) -> JobApplication {
    JobApplication {
        id: parse_id(&row.id, "application"),
        job_id: parse_id(&row.job_id, "application"),
        job_title: row.job_title,
        applicant_id: parse_id(&row.applicant_id, "application"),
        note: row.note,
        status: ApplicationStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt status '{}' on application '{}'", row.status, row.id);
            ApplicationStatus::Submitted
        }),
        created_at: parse_timestamp(&row.created_at, "application"),
    }
}
