// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Email verification code repository.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::super::database::{
    read_all_records, read_record, write_record, Database, EMAIL_VERIFICATIONS, USERS,
};
use super::super::{StorageError, StorageResult};
use super::users::StoredUser;

/// How long a verification code stays valid.
pub const VERIFICATION_CODE_TTL: Duration = Duration::minutes(5);

/// One-time email verification code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredVerification {
    pub id: String,
    pub user_id: String,
    pub email: String,
    /// Six-digit numeric code
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl StoredVerification {
    pub fn new(user_id: String, email: String, code: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            email,
            code,
            expires_at: Utc::now() + VERIFICATION_CODE_TTL,
            consumed: false,
        }
    }
}

/// Repository for email verification codes.
pub struct VerificationRepository<'a> {
    db: &'a Database,
}

impl<'a> VerificationRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, verification: &StoredVerification) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(EMAIL_VERIFICATIONS)?;
            write_record(&mut table, &verification.id, verification)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Consume the unconsumed code matching `(email, code)`.
    ///
    /// - `NotFound` if no unconsumed code matches
    /// - `Expired` if the matching code is past its expiry
    ///
    /// On success the code is consumed and its user marked verified in the
    /// same transaction. Returns the verified user's ID.
    pub fn consume(&self, email: &str, code: &str, now: DateTime<Utc>) -> StorageResult<String> {
        let write_txn = self.db.begin_write()?;
        let user_id = {
            let mut verifications = write_txn.open_table(EMAIL_VERIFICATIONS)?;
            let all: Vec<StoredVerification> = read_all_records(&verifications)?;
            let mut verification = all
                .into_iter()
                .find(|v| !v.consumed && v.email == email && v.code == code)
                .ok_or_else(|| StorageError::NotFound(format!("Verification code for {email}")))?;

            if now > verification.expires_at {
                return Err(StorageError::Expired(format!(
                    "Verification code for {email}"
                )));
            }

            verification.consumed = true;
            write_record(&mut verifications, &verification.id, &verification)?;

            let mut users = write_txn.open_table(USERS)?;
            let mut user: StoredUser = read_record(&users, &verification.user_id)?
                .ok_or_else(|| StorageError::NotFound(format!("User {}", verification.user_id)))?;
            user.verified_email = true;
            write_record(&mut users, &user.id, &user)?;

            user.id
        };
        write_txn.commit()?;
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::users::UserRepository;
    use super::*;

    fn setup() -> (Database, StoredUser, StoredVerification) {
        let db = Database::in_memory().unwrap();
        let user = StoredUser::new("u1".into(), "e1@example.com".into(), "hash".into());
        UserRepository::new(&db).create(&user).unwrap();
        let verification =
            StoredVerification::new(user.id.clone(), user.email.clone(), "123456".into());
        VerificationRepository::new(&db)
            .create(&verification)
            .unwrap();
        (db, user, verification)
    }

    #[test]
    fn code_is_single_use() {
        let (db, user, _) = setup();
        let repo = VerificationRepository::new(&db);

        let verified = repo.consume("e1@example.com", "123456", Utc::now()).unwrap();
        assert_eq!(verified, user.id);
        assert!(UserRepository::new(&db).get(&user.id).unwrap().verified_email);

        let again = repo.consume("e1@example.com", "123456", Utc::now());
        assert!(matches!(again, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn wrong_code_or_email_is_not_found() {
        let (db, user, _) = setup();
        let repo = VerificationRepository::new(&db);

        assert!(matches!(
            repo.consume("e1@example.com", "000000", Utc::now()),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            repo.consume("other@example.com", "123456", Utc::now()),
            Err(StorageError::NotFound(_))
        ));
        assert!(!UserRepository::new(&db).get(&user.id).unwrap().verified_email);
    }

    #[test]
    fn expired_code_is_rejected_and_left_unconsumed() {
        let (db, user, verification) = setup();
        let repo = VerificationRepository::new(&db);

        let late = verification.expires_at + Duration::seconds(1);
        assert!(matches!(
            repo.consume("e1@example.com", "123456", late),
            Err(StorageError::Expired(_))
        ));
        assert!(!UserRepository::new(&db).get(&user.id).unwrap().verified_email);

        // Still expired on retry, never silently accepted.
        assert!(matches!(
            repo.consume("e1@example.com", "123456", late),
            Err(StorageError::Expired(_))
        ));
    }
}
