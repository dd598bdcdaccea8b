use crate::Database;
use crate::models::ProductionRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn production_from_row(row: &Row) -> rusqlite::Result<ProductionRow> {
    Ok(ProductionRow {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        logline: row.get(3)?,
        status: row.get(4)?,
        starts_on: row.get(5)?,
        wraps_on: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const PRODUCTION_COLS: &str =
    "pr.id, pr.company_id, pr.title, pr.logline, pr.status, pr.starts_on, pr.wraps_on, pr.created_at";

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn create_production(
        &self,
        id: &str,
        company_id: &str,
        title: &str,
        logline: Option<&str>,
        status: &str,
        starts_on: Option<&str>,
        wraps_on: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO productions (id, company_id, title, logline, status, starts_on, wraps_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, company_id, title, logline, status, starts_on, wraps_on],
            )?;
            Ok(())
        })
    }

    pub fn get_production(&self, id: &str) -> Result<Option<ProductionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM productions pr WHERE pr.id = ?1", PRODUCTION_COLS),
                    [id],
                    production_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_productions_for_company(&self, company_id: &str) -> Result<Vec<ProductionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM productions pr
                 WHERE pr.company_id = ?1
                 ORDER BY pr.created_at DESC",
                PRODUCTION_COLS
            ))?;

            let rows = stmt
                .query_map([company_id], production_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_production(
        &self,
        id: &str,
        title: Option<&str>,
        logline: Option<&str>,
        status: Option<&str>,
        starts_on: Option<&str>,
        wraps_on: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE productions SET
                    title     = COALESCE(?2, title),
                    logline   = COALESCE(?3, logline),
                    status    = COALESCE(?4, status),
                    starts_on = COALESCE(?5, starts_on),
                    wraps_on  = COALESCE(?6, wraps_on)
                 WHERE id = ?1",
                params![id, title, logline, status, starts_on, wraps_on],
            )?;
            Ok(())
        })
    }
}
