use chrono::Utc;
use redb::{ReadableTable, Table};

use super::db::{Database, DatabaseError};
use super::models::{FileRecord, FileUpdate};
use super::tables::*;

type BlobTable<'txn> = Table<'txn, &'static str, &'static [u8]>;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Store a file record and update the owner and share-token indexes
    pub fn put_file(&self, file: &FileRecord) -> Result<(), DatabaseError> {
        self.put_files(std::slice::from_ref(file))
    }

    /// Store several file records in one transaction (all or nothing)
    pub fn put_files(&self, files: &[FileRecord]) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(FILES)?;
            let mut owner_table = write_txn.open_table(OWNER_FILES)?;
            let mut share_table = write_txn.open_table(SHARE_TOKENS)?;

            for file in files {
                debug_assert!(!file.id.is_empty(), "file id must not be empty");
                debug_assert!(!file.owner_id.is_empty(), "file owner must not be empty");

                let data = rmp_serde::to_vec_named(file)?;
                table.insert(file.id.as_str(), data.as_slice())?;
                index_add(&mut owner_table, &file.owner_id, &file.id)?;

                if let Some(ref token) = file.share_token {
                    share_table.insert(token.as_str(), file.id.as_str())?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a file by its UUID
    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Get a file by its share token (resolves token -> uuid -> file)
    pub fn get_file_by_share_token(&self, token: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let share_table = read_txn.open_table(SHARE_TOKENS)?;

        let id = match share_table.get(token)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let files_table = read_txn.open_table(FILES)?;
        match files_table.get(id.as_str())? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// All files of one owner, oldest first so desktop ordering is stable
    pub fn get_files_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let owner_table = read_txn.open_table(OWNER_FILES)?;
        let files_table = read_txn.open_table(FILES)?;

        let file_ids: Vec<String> = match owner_table.get(owner_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut files = Vec::new();
        for file_id in file_ids {
            if let Some(data) = files_table.get(file_id.as_str())? {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(files)
    }

    /// List an owner's files on the desktop (`deleted = false`) or in the recycle bin
    pub fn list_files(&self, owner_id: &str, deleted: bool) -> Result<Vec<FileRecord>, DatabaseError> {
        Ok(self
            .get_files_by_owner(owner_id)?
            .into_iter()
            .filter(|f| f.is_deleted == deleted)
            .collect())
    }

    /// Update a file's mutable fields. Returns the updated record, or `None` if missing.
    pub fn update_file(
        &self,
        id: &str,
        update: &FileUpdate,
    ) -> Result<Option<FileRecord>, DatabaseError> {
        self.modify_file(id, |file| {
            if let Some(ref name) = update.name {
                file.name = name.clone();
            }
            update.content.apply_to(&mut file.content);
            update.position_x.apply_to(&mut file.position_x);
            update.position_y.apply_to(&mut file.position_y);
            if let Some(size) = update.size {
                file.size = size;
            }
        })
    }

    /// Move a file to the recycle bin
    pub fn soft_delete_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let now = Utc::now();
        self.modify_file(id, |file| {
            file.is_deleted = true;
            file.deleted_at = Some(now);
        })
    }

    /// Bring a file back from the recycle bin
    pub fn restore_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        self.modify_file(id, |file| {
            file.is_deleted = false;
            file.deleted_at = None;
        })
    }

    /// Attach `candidate` as the share token unless the file already has one.
    /// Returns the record carrying whichever token is now in effect.
    pub fn issue_share_token(
        &self,
        id: &str,
        candidate: &str,
    ) -> Result<Option<FileRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let updated = {
            let mut table = write_txn.open_table(FILES)?;
            let existing = read_record(&table, id)?;

            match existing {
                Some(file) if file.share_token.is_some() => Some(file),
                Some(mut file) => {
                    file.share_token = Some(candidate.to_string());
                    file.updated_at = Utc::now();
                    let data = rmp_serde::to_vec_named(&file)?;
                    table.insert(id, data.as_slice())?;

                    let mut share_table = write_txn.open_table(SHARE_TOKENS)?;
                    share_table.insert(candidate, id)?;
                    Some(file)
                }
                None => None,
            }
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Remove a file and its index entries. Returns the removed record.
    pub fn delete_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let removed = {
            let mut table = write_txn.open_table(FILES)?;
            let mut owner_table = write_txn.open_table(OWNER_FILES)?;
            let mut share_table = write_txn.open_table(SHARE_TOKENS)?;

            match read_record(&table, id)? {
                Some(file) => {
                    table.remove(id)?;
                    index_remove(&mut owner_table, &file.owner_id, id)?;
                    if let Some(ref token) = file.share_token {
                        share_table.remove(token.as_str())?;
                    }
                    Some(file)
                }
                None => None,
            }
        };

        write_txn.commit()?;
        Ok(removed)
    }

    /// Remove every soft-deleted file of an owner. Returns the removed records.
    pub fn empty_trash(&self, owner_id: &str) -> Result<Vec<FileRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut removed = Vec::new();

        {
            let mut table = write_txn.open_table(FILES)?;
            let mut owner_table = write_txn.open_table(OWNER_FILES)?;
            let mut share_table = write_txn.open_table(SHARE_TOKENS)?;

            for id in index_get(&owner_table, owner_id)? {
                let Some(file) = read_record(&table, &id)? else {
                    continue;
                };
                if !file.is_deleted {
                    continue;
                }
                table.remove(id.as_str())?;
                index_remove(&mut owner_table, owner_id, &id)?;
                if let Some(ref token) = file.share_token {
                    share_table.remove(token.as_str())?;
                }
                removed.push(file);
            }
        }

        write_txn.commit()?;
        Ok(removed)
    }

    /// Read-modify-write a single record inside one transaction, bumping `updated_at`.
    fn modify_file(
        &self,
        id: &str,
        change: impl FnOnce(&mut FileRecord),
    ) -> Result<Option<FileRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let updated = {
            let mut table = write_txn.open_table(FILES)?;
            match read_record(&table, id)? {
                Some(mut file) => {
                    change(&mut file);
                    file.updated_at = Utc::now();
                    let data = rmp_serde::to_vec_named(&file)?;
                    table.insert(id, data.as_slice())?;
                    Some(file)
                }
                None => None,
            }
        };

        write_txn.commit()?;
        Ok(updated)
    }
}

fn read_record(table: &BlobTable<'_>, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
    let record = match table.get(id)? {
        Some(data) => Some(rmp_serde::from_slice(data.value())?),
        None => None,
    };
    Ok(record)
}

fn index_get(table: &BlobTable<'_>, owner_id: &str) -> Result<Vec<String>, DatabaseError> {
    let ids = match table.get(owner_id)? {
        Some(data) => rmp_serde::from_slice(data.value())?,
        None => Vec::new(),
    };
    Ok(ids)
}

fn index_add(table: &mut BlobTable<'_>, owner_id: &str, file_id: &str) -> Result<(), DatabaseError> {
    let mut ids = index_get(table, owner_id)?;
    if !ids.iter().any(|id| id == file_id) {
        ids.push(file_id.to_string());
        let data = rmp_serde::to_vec_named(&ids)?;
        table.insert(owner_id, data.as_slice())?;
    }
    Ok(())
}

fn index_remove(
    table: &mut BlobTable<'_>,
    owner_id: &str,
    file_id: &str,
) -> Result<(), DatabaseError> {
    let mut ids = index_get(table, owner_id)?;
    ids.retain(|id| id != file_id);
    if ids.is_empty() {
        table.remove(owner_id)?;
    } else {
        let data = rmp_serde::to_vec_named(&ids)?;
        table.insert(owner_id, data.as_slice())?;
    }
    Ok(())
}
