use crate::Database;
use crate::models::{CompanyRow, InvitationRow, MemberRow, ProfileRow};
use anyhow::{Result, bail};
use rusqlite::{OptionalExtension, Row, params};

fn company_from_row(row: &Row) -> rusqlite::Result<CompanyRow> {
    Ok(CompanyRow {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        website: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn invitation_from_row(row: &Row) -> rusqlite::Result<InvitationRow> {
    Ok(InvitationRow {
        id: row.get(0)?,
        company_id: row.get(1)?,
        invitee_id: row.get(2)?,
        inviter_id: row.get(3)?,
        role: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        responded_at: row.get(7)?,
    })
}

const COMPANY_COLS: &str = "co.id, co.name, co.slug, co.description, co.website, co.created_at";
const INVITATION_COLS: &str =
    "i.id, i.company_id, i.invitee_id, i.inviter_id, i.role, i.status, i.created_at, i.responded_at";

impl Database {
    pub fn slug_exists(&self, slug: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM production_companies WHERE slug = ?1)",
                [slug],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Insert the company and its owner membership in one transaction, so a
    /// company never exists without exactly one owner.
    pub fn create_company(
        &self,
        id: &str,
        name: &str,
        slug: &str,
        description: Option<&str>,
        website: Option<&str>,
        owner_id: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO production_companies (id, name, slug, description, website)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, name, slug, description, website],
            )?;
            tx.execute(
                "INSERT INTO production_company_members (company_id, user_id, role)
                 VALUES (?1, ?2, 'owner')",
                params![id, owner_id],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_company(&self, id: &str) -> Result<Option<CompanyRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM production_companies co WHERE co.id = ?1",
                        COMPANY_COLS
                    ),
                    [id],
                    company_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_company_by_slug(&self, slug: &str) -> Result<Option<CompanyRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM production_companies co WHERE co.slug = ?1",
                        COMPANY_COLS
                    ),
                    [slug],
                    company_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_company(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
        website: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE production_companies SET
                    name        = COALESCE(?2, name),
                    description = COALESCE(?3, description),
                    website     = COALESCE(?4, website)
                 WHERE id = ?1",
                params![id, name, description, website],
            )?;
            Ok(())
        })
    }

    pub fn member_role(&self, company_id: &str, user_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let role = conn
                .query_row(
                    "SELECT role FROM production_company_members
                     WHERE company_id = ?1 AND user_id = ?2",
                    params![company_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(role)
        })
    }

    pub fn list_members(&self, company_id: &str) -> Result<Vec<(MemberRow, ProfileRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT m.company_id, m.user_id, m.role, m.joined_at, {}
                 FROM production_company_members m
                 JOIN profiles p ON p.id = m.user_id
                 WHERE m.company_id = ?1
                 ORDER BY m.joined_at ASC",
                super::PROFILE_COLS
            ))?;

            let rows = stmt
                .query_map([company_id], |row| {
                    Ok((
                        MemberRow {
                            company_id: row.get(0)?,
                            user_id: row.get(1)?,
                            role: row.get(2)?,
                            joined_at: row.get(3)?,
                        },
                        super::profile_from_row(row, 4)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn add_member(&self, company_id: &str, user_id: &str, role: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO production_company_members (company_id, user_id, role)
                 VALUES (?1, ?2, ?3)",
                params![company_id, user_id, role],
            )?;
            Ok(())
        })
    }

    pub fn remove_member(&self, company_id: &str, user_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM production_company_members
                 WHERE company_id = ?1 AND user_id = ?2",
                params![company_id, user_id],
            )?;
            Ok(())
        })
    }

    /// Demote the current owner to admin and promote the new owner, in one
    /// transaction. The partial unique index on (company_id) WHERE
    /// role='owner' holds across the statement boundary because the demote
    /// runs first.
    pub fn transfer_ownership(
        &self,
        company_id: &str,
        current_owner: &str,
        new_owner: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let demoted = tx.execute(
                "UPDATE production_company_members SET role = 'admin'
                 WHERE company_id = ?1 AND user_id = ?2 AND role = 'owner'",
                params![company_id, current_owner],
            )?;
            if demoted != 1 {
                bail!("user {} does not own company {}", current_owner, company_id);
            }

            let promoted = tx.execute(
                "UPDATE production_company_members SET role = 'owner'
                 WHERE company_id = ?1 AND user_id = ?2",
                params![company_id, new_owner],
            )?;
            if promoted != 1 {
                bail!("user {} is not a member of company {}", new_owner, company_id);
            }

            tx.commit()?;
            Ok(())
        })
    }

    // -- Invitations --

    pub fn pending_invitation_exists(&self, company_id: &str, invitee_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM company_invitations
                     WHERE company_id = ?1 AND invitee_id = ?2 AND status = 'pending'
                 )",
                params![company_id, invitee_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn create_invitation(
        &self,
        id: &str,
        company_id: &str,
        invitee_id: &str,
        inviter_id: &str,
        role: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO company_invitations (id, company_id, invitee_id, inviter_id, role)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, company_id, invitee_id, inviter_id, role],
            )?;
            Ok(())
        })
    }

    pub fn get_invitation(&self, id: &str) -> Result<Option<InvitationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM company_invitations i WHERE i.id = ?1",
                        INVITATION_COLS
                    ),
                    [id],
                    invitation_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Pending invitations addressed to the user, with the inviting company.
    pub fn list_invitations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<(InvitationRow, CompanyRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, {}
                 FROM company_invitations i
                 JOIN production_companies co ON co.id = i.company_id
                 WHERE i.invitee_id = ?1 AND i.status = 'pending'
                 ORDER BY i.created_at DESC",
                INVITATION_COLS, COMPANY_COLS
            ))?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok((
                        invitation_from_row(row)?,
                        CompanyRow {
                            id: row.get(8)?,
                            name: row.get(9)?,
                            slug: row.get(10)?,
                            description: row.get(11)?,
                            website: row.get(12)?,
                            created_at: row.get(13)?,
                        },
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Flip the invitation to accepted and insert the membership row in one
    /// transaction.
    pub fn accept_invitation(
        &self,
        invitation_id: &str,
        company_id: &str,
        user_id: &str,
        role: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE company_invitations
                 SET status = 'accepted', responded_at = datetime('now')
                 WHERE id = ?1",
                [invitation_id],
            )?;
            tx.execute(
                "INSERT INTO production_company_members (company_id, user_id, role)
                 VALUES (?1, ?2, ?3)",
                params![company_id, user_id, role],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn decline_invitation(&self, invitation_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE company_invitations
                 SET status = 'declined', responded_at = datetime('now')
                 WHERE id = ?1",
                [invitation_id],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_profile, test_db};
    use crate::Database;

    fn owner_of(db: &Database, company_id: &str) -> Vec<String> {
        db.list_members(company_id)
            .unwrap()
            .into_iter()
            .filter(|(m, _)| m.role == "owner")
            .map(|(m, _)| m.user_id)
            .collect()
    }

    #[test]
    fn transfer_keeps_exactly_one_owner() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");

        db.create_company("co1", "Moonlight Films", "moonlight-films", None, None, "a")
            .unwrap();
        db.add_member("co1", "b", "member").unwrap();

        db.transfer_ownership("co1", "a", "b").unwrap();

        assert_eq!(owner_of(&db, "co1"), vec!["b".to_string()]);
        assert_eq!(db.member_role("co1", "a").unwrap().as_deref(), Some("admin"));
    }

    #[test]
    fn transfer_to_a_non_member_fails_and_changes_nothing() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");

        db.create_company("co1", "Moonlight Films", "moonlight-films", None, None, "a")
            .unwrap();

        assert!(db.transfer_ownership("co1", "a", "b").is_err());
        assert_eq!(owner_of(&db, "co1"), vec!["a".to_string()]);
        assert_eq!(db.member_role("co1", "a").unwrap().as_deref(), Some("owner"));
    }

    #[test]
    fn duplicate_pending_invitation_is_rejected() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");

        db.create_company("co1", "Moonlight Films", "moonlight-films", None, None, "a")
            .unwrap();
        db.create_invitation("i1", "co1", "b", "a", "member").unwrap();

        let err = db
            .create_invitation("i2", "co1", "b", "a", "admin")
            .unwrap_err();
        assert!(crate::is_constraint_violation(&err));

        // A declined invitation frees the slot.
        db.decline_invitation("i1").unwrap();
        db.create_invitation("i3", "co1", "b", "a", "member").unwrap();
    }

    #[test]
    fn accepting_an_invitation_adds_the_member() {
        let db = test_db();
        seed_profile(&db, "a", "ava@example.com");
        seed_profile(&db, "b", "ben@example.com");

        db.create_company("co1", "Moonlight Films", "moonlight-films", None, None, "a")
            .unwrap();
        db.create_invitation("i1", "co1", "b", "a", "admin").unwrap();
        db.accept_invitation("i1", "co1", "b", "admin").unwrap();

        assert_eq!(db.member_role("co1", "b").unwrap().as_deref(), Some("admin"));
        assert!(db.list_invitations_for_user("b").unwrap().is_empty());
    }
}
