use chrono::{DateTime, Utc};
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{
    SessionRecord, SettingsRecord, SettingsUpdate, UserRecord, DEFAULT_THEME,
};
use super::tables::*;

impl Database {
    // ========================================================================
    // Users
    // ========================================================================

    /// Insert or refresh a user, keeping the original `created_at`
    pub fn upsert_user(&self, user: &UserRecord) -> Result<UserRecord, DatabaseError> {
        let write_txn = self.begin_write()?;

        let stored = {
            let mut table = write_txn.open_table(USERS)?;
            let existing: Option<UserRecord> = match table.get(user.id.as_str())? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            let mut record = user.clone();
            if let Some(existing) = existing {
                record.created_at = existing.created_at;
            }
            record.updated_at = Utc::now();

            let data = rmp_serde::to_vec_named(&record)?;
            table.insert(record.id.as_str(), data.as_slice())?;
            record
        };

        write_txn.commit()?;
        Ok(stored)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    pub fn put_session(&self, session: &SessionRecord) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let data = rmp_serde::to_vec_named(session)?;
            table.insert(session.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        match table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    pub fn delete_session(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Remove every session expired at `now`. Returns how many were removed.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let write_txn = self.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS)?;

            let mut expired = Vec::new();
            for result in table.iter()? {
                let (key, value) = result?;
                let session: SessionRecord = rmp_serde::from_slice(value.value())?;
                if session.is_expired(now) {
                    expired.push(key.value().to_string());
                }
            }

            for id in &expired {
                table.remove(id.as_str())?;
            }
            expired.len() as u64
        };
        write_txn.commit()?;
        Ok(removed)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn get_settings(&self, user_id: &str) -> Result<Option<SettingsRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SETTINGS)?;

        match table.get(user_id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Create the user's settings record if absent, then apply the update
    pub fn upsert_settings(
        &self,
        user_id: &str,
        update: &SettingsUpdate,
    ) -> Result<SettingsRecord, DatabaseError> {
        let write_txn = self.begin_write()?;

        let stored = {
            let mut table = write_txn.open_table(SETTINGS)?;
            let existing: Option<SettingsRecord> = match table.get(user_id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            let now = Utc::now();
            let mut record = existing.unwrap_or_else(|| SettingsRecord {
                user_id: user_id.to_string(),
                theme: DEFAULT_THEME.to_string(),
                desktop_background: None,
                custom_colors: None,
                created_at: now,
                updated_at: now,
            });

            if let Some(ref theme) = update.theme {
                record.theme = theme.clone();
            }
            update
                .desktop_background
                .apply_to(&mut record.desktop_background);
            update.custom_colors.apply_to(&mut record.custom_colors);
            record.updated_at = now;

            let data = rmp_serde::to_vec_named(&record)?;
            table.insert(user_id, data.as_slice())?;
            record
        };

        write_txn.commit()?;
        Ok(stored)
    }
}
