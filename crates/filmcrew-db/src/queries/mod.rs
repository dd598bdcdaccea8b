mod companies;
mod connections;
mod jobs;
mod messaging;
mod productions;
mod profiles;
mod tokens;

use crate::models::ProfileRow;
use rusqlite::Row;

/// Column list for profile joins (alias `p`); keep in sync with
/// `profile_from_row`.
pub(crate) const PROFILE_COLS: &str = "p.id, p.email, p.display_name, p.headline, p.department, \
     p.location, p.bio, p.avatar_key, p.created_at";

pub(crate) fn profile_from_row(row: &Row, base: usize) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(base)?,
        email: row.get(base + 1)?,
        display_name: row.get(base + 2)?,
        headline: row.get(base + 3)?,
        department: row.get(base + 4)?,
        location: row.get(base + 5)?,
        bio: row.get(base + 6)?,
        avatar_key: row.get(base + 7)?,
        created_at: row.get(base + 8)?,
    })
}

/// Order an unordered user pair the way the pair-keyed tables store it.
pub(crate) fn pair_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::Database;
    use std::path::Path;

    pub fn test_db() -> Database {
        Database::open(Path::new(":memory:")).unwrap()
    }

    pub fn seed_profile(db: &Database, id: &str, email: &str) {
        db.create_profile(id, email, email.split('@').next().unwrap())
            .unwrap();
    }
}
