use crate::Database;
use crate::models::{ApplicationRow, JobRow, ProfileRow};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn job_from_row(row: &Row) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        production_id: row.get(1)?,
        production_title: row.get(2)?,
        company_id: row.get(3)?,
        company_name: row.get(4)?,
        title: row.get(5)?,
        department: row.get(6)?,
        description: row.get(7)?,
        rate: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn application_from_row(row: &Row) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        job_title: row.get(2)?,
        applicant_id: row.get(3)?,
        note: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        responded_at: row.get(7)?,
    })
}

// Listings always carry the production and company, so job rows are
// fetched through this join.
const JOB_SELECT: &str = "SELECT j.id, j.production_id, pr.title, pr.company_id, co.name,
            j.title, j.department, j.description, j.rate, j.status, j.created_at
     FROM job_posts j
     JOIN productions pr ON pr.id = j.production_id
     JOIN production_companies co ON co.id = pr.company_id";

const APPLICATION_SELECT: &str =
    "SELECT a.id, a.job_id, j.title, a.applicant_id, a.note, a.status, a.created_at, a.responded_at
     FROM job_applications a
     JOIN job_posts j ON j.id = a.job_id";

impl Database {
    pub fn create_job(
        &self,
        id: &str,
        production_id: &str,
        title: &str,
        department: &str,
        description: Option<&str>,
        rate: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO job_posts (id, production_id, title, department, description, rate)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, production_id, title, department, description, rate],
            )?;
            Ok(())
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(&format!("{} WHERE j.id = ?1", JOB_SELECT), [id], job_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Listing with server-side filters; no pagination by design.
    pub fn list_jobs(
        &self,
        department: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE (?1 IS NULL OR j.department = ?1)
                    AND (?2 IS NULL OR j.status = ?2)
                  ORDER BY j.created_at DESC",
                JOB_SELECT
            ))?;

            let rows = stmt
                .query_map(params![department, status], job_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn set_job_status(&self, id: &str, status: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE job_posts SET status = ?2 WHERE id = ?1",
                params![id, status],
            )?;
            Ok(())
        })
    }

    pub fn application_exists(&self, job_id: &str, applicant_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM job_applications WHERE job_id = ?1 AND applicant_id = ?2
                 )",
                params![job_id, applicant_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn create_application(
        &self,
        id: &str,
        job_id: &str,
        applicant_id: &str,
        note: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO job_applications (id, job_id, applicant_id, note)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, job_id, applicant_id, note],
            )?;
            Ok(())
        })
    }

    pub fn get_application(&self, id: &str) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("{} WHERE a.id = ?1", APPLICATION_SELECT),
                    [id],
                    application_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_applications_for_job(
        &self,
        job_id: &str,
    ) -> Result<Vec<(ApplicationRow, ProfileRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT a.id, a.job_id, j.title, a.applicant_id, a.note, a.status,
                        a.created_at, a.responded_at, {}
                 FROM job_applications a
                 JOIN job_posts j ON j.id = a.job_id
                 JOIN profiles p ON p.id = a.applicant_id
                 WHERE a.job_id = ?1
                 ORDER BY a.created_at ASC",
                super::PROFILE_COLS
            ))?;

            let rows = stmt
                .query_map([job_id], |row| {
                    Ok((application_from_row(row)?, super::profile_from_row(row, 8)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn list_applications_for_user(&self, user_id: &str) -> Result<Vec<ApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE a.applicant_id = ?1 ORDER BY a.created_at DESC",
                APPLICATION_SELECT
            ))?;

            let rows = stmt
                .query_map([user_id], application_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn set_application_status(&self, id: &str, status: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE job_applications
                 SET status = ?2, responded_at = datetime('now')
                 WHERE id = ?1",
                params![id, status],
            )?;
            Ok(())
        })
    }
}
