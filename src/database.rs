//! Read access to the capture database (`training_data` table).

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;

use crate::types::{GazeRecord, OpennessRecord};

pub struct CaptureDatabase {
    conn: Connection,
}

impl CaptureDatabase {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open capture database {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Gaze samples with both eye frames present, in rowid order
    pub fn gaze_rows(&self) -> Result<Vec<GazeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT rowid, leftEyeFrame, rightEyeFrame, theta1, theta2
             FROM training_data
             WHERE leftEyeFrame != '' AND rightEyeFrame != '' AND type = 'gaze'
             ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], map_gaze)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read gaze rows")?;
        Ok(rows)
    }

    pub fn openness_rows(&self) -> Result<Vec<OpennessRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT rowid, leftEyeFrame, rightEyeFrame, openness
             FROM training_data
             WHERE leftEyeFrame != '' AND rightEyeFrame != '' AND type = 'openness'
             ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(OpennessRecord {
                    rowid: row.get(0)?,
                    left_frame: row.get(1)?,
                    right_frame: row.get(2)?,
                    openness: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read openness rows")?;
        Ok(rows)
    }

    /// Up to `limit` gaze samples picked at random
    pub fn random_gaze_rows(&self, limit: usize) -> Result<Vec<GazeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT rowid, leftEyeFrame, rightEyeFrame, theta1, theta2
             FROM training_data
             WHERE leftEyeFrame != '' AND rightEyeFrame != '' AND type = 'gaze'
             ORDER BY RANDOM()
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], map_gaze)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to sample gaze rows")?;
        Ok(rows)
    }
}

fn map_gaze(row: &rusqlite::Row<'_>) -> rusqlite::Result<GazeRecord> {
    Ok(GazeRecord {
        rowid: row.get(0)?,
        left_frame: row.get(1)?,
        right_frame: row.get(2)?,
        theta1: row.get(3)?,
        theta2: row.get(4)?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::{params, Connection};

    pub const SCHEMA: &str = "CREATE TABLE training_data (
        leftEyeFrame TEXT,
        rightEyeFrame TEXT,
        theta1 REAL,
        theta2 REAL,
        openness REAL,
        type TEXT
    )";

    pub fn create(conn: &Connection) {
        conn.execute(SCHEMA, []).unwrap();
    }

    pub fn insert_gaze(conn: &Connection, left: &str, right: &str, theta1: f64, theta2: f64) {
        conn.execute(
            "INSERT INTO training_data (leftEyeFrame, rightEyeFrame, theta1, theta2, type)
             VALUES (?1, ?2, ?3, ?4, 'gaze')",
            params![left, right, theta1, theta2],
        )
        .unwrap();
    }

    pub fn insert_openness(conn: &Connection, left: &str, right: &str, openness: f64) {
        conn.execute(
            "INSERT INTO training_data (leftEyeFrame, rightEyeFrame, openness, type)
             VALUES (?1, ?2, ?3, 'openness')",
            params![left, right, openness],
        )
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn seeded() -> CaptureDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create(&conn);
        insert_gaze(&conn, "data:a,AA", "data:b,AA", 0.1, -0.2);
        insert_gaze(&conn, "", "data:b,AA", 0.3, 0.4);
        insert_gaze(&conn, "data:a,AA", "data:b,AA", 0.5, 0.6);
        insert_openness(&conn, "data:a,AA", "data:b,AA", 0.9);
        conn.execute(
            "INSERT INTO training_data (leftEyeFrame, rightEyeFrame, type) VALUES (NULL, 'x', 'gaze')",
            [],
        )
        .unwrap();
        CaptureDatabase::from_connection(conn)
    }

    #[test]
    fn gaze_rows_skip_empty_and_null_frames() {
        let db = seeded();
        let rows = db.gaze_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rowid, 1);
        assert_eq!(rows[1].rowid, 3);
        assert_eq!(rows[1].theta2, Some(0.6));
    }

    #[test]
    fn openness_rows_are_separate() {
        let db = seeded();
        let rows = db.openness_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rowid, 4);
        assert_eq!(rows[0].openness, Some(0.9));
    }

    #[test]
    fn random_rows_respect_limit() {
        let db = seeded();
        assert_eq!(db.random_gaze_rows(1).unwrap().len(), 1);
        assert_eq!(db.random_gaze_rows(10).unwrap().len(), 2);
    }
}
