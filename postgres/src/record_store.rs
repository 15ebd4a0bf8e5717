//! `PostgreSQL` implementation of [`RecordStore`].

use crate::query::{select_conferences, CONFERENCE_COLUMNS};
use chrono::NaiveDate;
use conference_core::query::ConferenceQuery;
use conference_core::record_store::{
    RecordStore, RecordStoreError, RecordWrite, StoreFuture, Versioned,
};
use conference_core::types::{
    Conference, ConferenceId, ConferenceKey, Profile, TeeShirtSize, UserId, Version,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const PROFILE_COLUMNS: &str =
    "user_id, display_name, main_email, tee_shirt_size, conference_keys_to_attend, version";

/// `PostgreSQL`-backed record store.
///
/// Every row carries a `version` column. A commit runs in one transaction:
/// updates are guarded by `WHERE version = expected`, inserts by the primary
/// key, and the first write that affects no row rolls the whole batch back
/// with [`RecordStoreError::ConcurrencyConflict`].
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Create a record store over an existing pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with at most `max_connections` connections.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::DatabaseError`] if the connection fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, RecordStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| RecordStoreError::DatabaseError(format!("Failed to connect: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::DatabaseError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), RecordStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RecordStoreError::DatabaseError(format!("Migration failed: {e}")))?;

        tracing::info!("Record store migrations applied");
        Ok(())
    }

    /// The underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_conferences(
        &self,
        query: &ConferenceQuery,
    ) -> Result<Vec<Conference>, RecordStoreError> {
        let mut builder = select_conferences(query);
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("query conferences", &e))?;

        rows.iter()
            .map(|row| row_to_conference(row).map(|versioned| versioned.record))
            .collect()
    }

    async fn apply(&self, writes: Vec<RecordWrite>) -> Result<(), RecordStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("begin transaction", &e))?;

        for write in &writes {
            let affected = match write {
                RecordWrite::Profile { profile, expected } => {
                    write_profile(&mut tx, profile, *expected).await?
                }
                RecordWrite::Conference {
                    conference,
                    expected,
                } => write_conference(&mut tx, conference, *expected).await?,
            };

            if affected == 0 {
                let actual = current_version(&mut tx, write).await?;
                tracing::debug!(
                    record = %write.record_name(),
                    expected = ?write.expected(),
                    actual = ?actual,
                    "Commit rejected"
                );
                // Dropping the transaction rolls it back
                return Err(RecordStoreError::ConcurrencyConflict {
                    record: write.record_name(),
                    expected: write.expected(),
                    actual,
                });
            }
        }

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", &e))?;

        tracing::debug!(writes = writes.len(), "Records committed");
        Ok(())
    }
}

impl RecordStore for PostgresRecordStore {
    fn get_profile(&self, user_id: &UserId) -> StoreFuture<'_, Option<Versioned<Profile>>> {
        let user_id = user_id.clone();
        Box::pin(async move {
            let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
            let row = sqlx::query(&sql)
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("load profile", &e))?;

            row.as_ref().map(row_to_profile).transpose()
        })
    }

    fn get_profiles(&self, user_ids: &[UserId]) -> StoreFuture<'_, Vec<Profile>> {
        let ids: Vec<String> = user_ids.iter().map(|id| id.as_str().to_string()).collect();
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ANY($1)"
            ))
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("load profiles", &e))?;

            rows.iter()
                .map(|row| row_to_profile(row).map(|versioned| versioned.record))
                .collect()
        })
    }

    fn get_conference(
        &self,
        key: &ConferenceKey,
    ) -> StoreFuture<'_, Option<Versioned<Conference>>> {
        let key = key.clone();
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {CONFERENCE_COLUMNS} FROM conferences \
                 WHERE id = $1 AND organizer_user_id = $2"
            ))
            .bind(*key.id().as_uuid())
            .bind(key.organizer().as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("load conference", &e))?;

            row.as_ref().map(row_to_conference).transpose()
        })
    }

    fn get_conferences(&self, keys: &[ConferenceKey]) -> StoreFuture<'_, Vec<Conference>> {
        let keys = keys.to_vec();
        Box::pin(async move {
            let ids: Vec<Uuid> = keys.iter().map(|key| *key.id().as_uuid()).collect();
            let rows = sqlx::query(&format!(
                "SELECT {CONFERENCE_COLUMNS} FROM conferences WHERE id = ANY($1)"
            ))
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("load conferences", &e))?;

            let found = rows
                .iter()
                .map(|row| row_to_conference(row).map(|versioned| versioned.record))
                .collect::<Result<Vec<_>, _>>()?;

            // Caller's key order; keys whose organizer does not match are missing
            Ok(keys
                .iter()
                .filter_map(|key| found.iter().find(|c| &c.key == key).cloned())
                .collect())
        })
    }

    fn query_conferences(&self, query: &ConferenceQuery) -> StoreFuture<'_, Vec<Conference>> {
        let query = query.clone();
        Box::pin(async move { self.fetch_conferences(&query).await })
    }

    fn conferences_by_organizer(&self, organizer: &UserId) -> StoreFuture<'_, Vec<Conference>> {
        let organizer = organizer.clone();
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT {CONFERENCE_COLUMNS} FROM conferences WHERE organizer_user_id = $1 \
                 ORDER BY name COLLATE \"C\", id"
            ))
            .bind(organizer.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("load organizer conferences", &e))?;

            rows.iter()
                .map(|row| row_to_conference(row).map(|versioned| versioned.record))
                .collect()
        })
    }

    fn commit(&self, writes: Vec<RecordWrite>) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.apply(writes).await })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("ping database", &e))?;
            Ok(())
        })
    }
}

// ===== Writes =====

async fn write_profile(
    tx: &mut Transaction<'_, Postgres>,
    profile: &Profile,
    expected: Option<Version>,
) -> Result<u64, RecordStoreError> {
    let keys: Vec<String> = profile
        .conference_keys_to_attend
        .iter()
        .map(ConferenceKey::to_websafe)
        .collect();

    let result = match expected {
        Some(version) => {
            sqlx::query(
                r"
                UPDATE profiles
                SET display_name = $2, main_email = $3, tee_shirt_size = $4,
                    conference_keys_to_attend = $5, version = version + 1
                WHERE user_id = $1 AND version = $6
                ",
            )
            .bind(profile.user_id.as_str())
            .bind(&profile.display_name)
            .bind(&profile.main_email)
            .bind(profile.tee_shirt_size.as_str())
            .bind(&keys)
            .bind(to_db_version(version)?)
            .execute(&mut **tx)
            .await
        }
        None => {
            sqlx::query(
                r"
                INSERT INTO profiles (
                    user_id, display_name, main_email, tee_shirt_size,
                    conference_keys_to_attend, version
                ) VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (user_id) DO NOTHING
                ",
            )
            .bind(profile.user_id.as_str())
            .bind(&profile.display_name)
            .bind(&profile.main_email)
            .bind(profile.tee_shirt_size.as_str())
            .bind(&keys)
            .bind(to_db_version(Version::initial())?)
            .execute(&mut **tx)
            .await
        }
    }
    .map_err(|e| database_error("write profile", &e))?;

    Ok(result.rows_affected())
}

async fn write_conference(
    tx: &mut Transaction<'_, Postgres>,
    conference: &Conference,
    expected: Option<Version>,
) -> Result<u64, RecordStoreError> {
    let month = to_db_int("month", conference.month)?;
    let max_attendees = to_db_int("max_attendees", conference.max_attendees)?;
    let seats_available = to_db_int("seats_available", conference.seats_available)?;

    let result = match expected {
        Some(version) => {
            sqlx::query(
                r"
                UPDATE conferences
                SET name = $3, description = $4, topics = $5, city = $6,
                    start_date = $7, end_date = $8, month = $9,
                    max_attendees = $10, seats_available = $11, version = version + 1
                WHERE id = $1 AND organizer_user_id = $2 AND version = $12
                ",
            )
            .bind(*conference.key.id().as_uuid())
            .bind(conference.key.organizer().as_str())
            .bind(&conference.name)
            .bind(&conference.description)
            .bind(&conference.topics)
            .bind(&conference.city)
            .bind(conference.start_date)
            .bind(conference.end_date)
            .bind(month)
            .bind(max_attendees)
            .bind(seats_available)
            .bind(to_db_version(version)?)
            .execute(&mut **tx)
            .await
        }
        None => {
            sqlx::query(
                r"
                INSERT INTO conferences (
                    id, organizer_user_id, name, description, topics, city,
                    start_date, end_date, month, max_attendees, seats_available, version
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (id) DO NOTHING
                ",
            )
            .bind(*conference.key.id().as_uuid())
            .bind(conference.key.organizer().as_str())
            .bind(&conference.name)
            .bind(&conference.description)
            .bind(&conference.topics)
            .bind(&conference.city)
            .bind(conference.start_date)
            .bind(conference.end_date)
            .bind(month)
            .bind(max_attendees)
            .bind(seats_available)
            .bind(to_db_version(Version::initial())?)
            .execute(&mut **tx)
            .await
        }
    }
    .map_err(|e| database_error("write conference", &e))?;

    Ok(result.rows_affected())
}

async fn current_version(
    tx: &mut Transaction<'_, Postgres>,
    write: &RecordWrite,
) -> Result<Option<Version>, RecordStoreError> {
    let version: Option<(i64,)> = match write {
        RecordWrite::Profile { profile, .. } => {
            sqlx::query_as("SELECT version FROM profiles WHERE user_id = $1")
                .bind(profile.user_id.as_str())
                .fetch_optional(&mut **tx)
                .await
        }
        RecordWrite::Conference { conference, .. } => {
            sqlx::query_as("SELECT version FROM conferences WHERE id = $1")
                .bind(*conference.key.id().as_uuid())
                .fetch_optional(&mut **tx)
                .await
        }
    }
    .map_err(|e| database_error("read current version", &e))?;

    version.map(|(v,)| from_db_version(v)).transpose()
}

// ===== Row decoding =====

fn row_to_profile(row: &PgRow) -> Result<Versioned<Profile>, RecordStoreError> {
    let user_id: String = column(row, "user_id")?;
    let tee_shirt_size: String = column(row, "tee_shirt_size")?;
    let keys: Vec<String> = column(row, "conference_keys_to_attend")?;

    let conference_keys_to_attend = keys
        .iter()
        .map(|key| {
            ConferenceKey::parse_websafe(key)
                .map_err(|e| RecordStoreError::SerializationError(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let profile = Profile {
        user_id: UserId::new(user_id),
        display_name: column(row, "display_name")?,
        main_email: column(row, "main_email")?,
        tee_shirt_size: tee_shirt_size
            .parse::<TeeShirtSize>()
            .map_err(RecordStoreError::SerializationError)?,
        conference_keys_to_attend,
    };

    Ok(Versioned::new(profile, from_db_version(column(row, "version")?)?))
}

fn row_to_conference(row: &PgRow) -> Result<Versioned<Conference>, RecordStoreError> {
    let id: Uuid = column(row, "id")?;
    let organizer: String = column(row, "organizer_user_id")?;
    let start_date: Option<NaiveDate> = column(row, "start_date")?;
    let end_date: Option<NaiveDate> = column(row, "end_date")?;

    let conference = Conference {
        key: ConferenceKey::new(UserId::new(organizer), ConferenceId::from_uuid(id)),
        name: column(row, "name")?,
        description: column(row, "description")?,
        topics: column(row, "topics")?,
        city: column(row, "city")?,
        start_date,
        end_date,
        month: from_db_int("month", column(row, "month")?)?,
        max_attendees: from_db_int("max_attendees", column(row, "max_attendees")?)?,
        seats_available: from_db_int("seats_available", column(row, "seats_available")?)?,
    };

    Ok(Versioned::new(conference, from_db_version(column(row, "version")?)?))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, RecordStoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| RecordStoreError::SerializationError(format!("Failed to decode {name}: {e}")))
}

// ===== Conversions =====

fn to_db_int(name: &str, value: u32) -> Result<i32, RecordStoreError> {
    i32::try_from(value)
        .map_err(|_| RecordStoreError::SerializationError(format!("{name} out of range: {value}")))
}

fn from_db_int(name: &str, value: i32) -> Result<u32, RecordStoreError> {
    u32::try_from(value)
        .map_err(|_| RecordStoreError::SerializationError(format!("negative {name}: {value}")))
}

fn to_db_version(version: Version) -> Result<i64, RecordStoreError> {
    i64::try_from(version.value()).map_err(|_| {
        RecordStoreError::SerializationError(format!("version out of range: {version}"))
    })
}

fn from_db_version(version: i64) -> Result<Version, RecordStoreError> {
    u64::try_from(version)
        .map(Version::new)
        .map_err(|_| RecordStoreError::SerializationError(format!("negative version: {version}")))
}

fn database_error(operation: &str, error: &sqlx::Error) -> RecordStoreError {
    RecordStoreError::DatabaseError(format!("Failed to {operation}: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conversion_rejects_negative_values() {
        assert_eq!(from_db_version(3), Ok(Version::new(3)));
        assert!(matches!(
            from_db_version(-1),
            Err(RecordStoreError::SerializationError(_))
        ));
    }

    #[test]
    fn seat_counts_must_fit_integer_columns() {
        assert_eq!(to_db_int("max_attendees", 500), Ok(500));
        assert!(to_db_int("max_attendees", u32::MAX).is_err());
        assert!(from_db_int("seats_available", -2).is_err());
    }
}
