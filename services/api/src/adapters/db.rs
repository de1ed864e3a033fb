//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `UserStore` and `RescueStore` ports from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use beyond_bark_core::domain::{
    Actor, AuthSession, NewRescuePet, Profile, RescuePet, User, UserCredentials,
};
use beyond_bark_core::ports::{PortError, PortResult, RescueStore, UserStore};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    display_name: String,
    email: String,
    hashed_password: String,
    phone: Option<String>,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    favorite_animal: Option<String>,
    favorite_pet: Option<String>,
    favorite_bird: Option<String>,
    photo_url: Option<String>,
}
impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            display_name: self.display_name,
            email: self.email,
            hashed_password: self.hashed_password,
            profile: Profile {
                phone: self.phone,
                date_of_birth: self.date_of_birth,
                gender: self.gender,
                favorite_animal: self.favorite_animal,
                favorite_pet: self.favorite_pet,
                favorite_bird: self.favorite_bird,
                photo_url: self.photo_url,
            },
        }
    }
}

const USER_COLUMNS: &str = "user_id, display_name, email, hashed_password, phone, date_of_birth, gender, \
     favorite_animal, favorite_pet, favorite_bird, photo_url";

#[derive(FromRow)]
struct RescuePetRecord {
    pet_id: Uuid,
    common_name: String,
    breed: String,
    location: String,
    condition: String,
    registered_by: String,
    registered_by_email: String,
    register_date: DateTime<Utc>,
    rescued: bool,
    rescued_by: Option<String>,
    rescued_by_email: Option<String>,
    rescue_date: Option<DateTime<Utc>>,
}
impl RescuePetRecord {
    fn to_domain(self) -> RescuePet {
        RescuePet {
            id: self.pet_id,
            common_name: self.common_name,
            breed: self.breed,
            location: self.location,
            condition: self.condition,
            registered_by: self.registered_by,
            registered_by_email: self.registered_by_email,
            register_date: self.register_date,
            rescued: self.rescued,
            rescued_by: self.rescued_by,
            rescued_by_email: self.rescued_by_email,
            rescue_date: self.rescue_date,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user_with_email(
        &self,
        display_name: &str,
        email: &str,
        hashed_password: &str,
        profile: &Profile,
    ) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (user_id, display_name, email, hashed_password, phone, date_of_birth, gender) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(display_name)
            .bind(email)
            .bind(hashed_password)
            .bind(&profile.phone)
            .bind(profile.date_of_birth)
            .bind(&profile.gender)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    PortError::Conflict(format!("An account for {} already exists", email))
                }
                _ => unexpected(e),
            })?;

        Ok(record.to_credentials().to_user())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
                _ => unexpected(e),
            })?;
        Ok(record.to_credentials())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: &str,
        profile: &Profile,
    ) -> PortResult<User> {
        let sql = format!(
            "UPDATE users SET display_name = $2, phone = $3, date_of_birth = $4, gender = $5, \
             favorite_animal = $6, favorite_pet = $7, favorite_bird = $8, photo_url = $9 \
             WHERE user_id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .bind(display_name)
            .bind(&profile.phone)
            .bind(profile.date_of_birth)
            .bind(&profile.gender)
            .bind(&profile.favorite_animal)
            .bind(&profile.favorite_pet)
            .bind(&profile.favorite_bird)
            .bind(&profile.photo_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;

        info!(%user_id, "Profile updated");
        Ok(record.to_credentials().to_user())
    }

    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str, now: DateTime<Utc>) -> PortResult<User> {
        let sql = format!(
            "SELECT {} FROM users WHERE user_id = \
             (SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > $2)",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(session_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::Unauthorized,
                _ => unexpected(e),
            })?;
        Ok(record.to_credentials().to_user())
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `RescueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RescueStore for DbAdapter {
    async fn register_pet(&self, pet: NewRescuePet, registrant: &Actor) -> PortResult<RescuePet> {
        let pet = RescuePet::register(pet, registrant, Utc::now());
        let record = sqlx::query_as::<_, RescuePetRecord>(
            "INSERT INTO rescue_pets \
             (pet_id, common_name, breed, location, condition, registered_by, registered_by_email, register_date, rescued) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE) \
             RETURNING pet_id, common_name, breed, location, condition, registered_by, registered_by_email, \
             register_date, rescued, rescued_by, rescued_by_email, rescue_date",
        )
        .bind(pet.id)
        .bind(&pet.common_name)
        .bind(&pet.breed)
        .bind(&pet.location)
        .bind(&pet.condition)
        .bind(&pet.registered_by)
        .bind(&pet.registered_by_email)
        .bind(pet.register_date)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        info!(pet_id = %record.pet_id, "Registered pet for rescue");
        Ok(record.to_domain())
    }

    async fn get_pet(&self, pet_id: Uuid) -> PortResult<RescuePet> {
        let record = sqlx::query_as::<_, RescuePetRecord>(
            "SELECT pet_id, common_name, breed, location, condition, registered_by, registered_by_email, \
             register_date, rescued, rescued_by, rescued_by_email, rescue_date \
             FROM rescue_pets WHERE pet_id = $1",
        )
        .bind(pet_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Pet {} not found", pet_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_pets(&self, rescued: bool) -> PortResult<Vec<RescuePet>> {
        let records = sqlx::query_as::<_, RescuePetRecord>(
            "SELECT pet_id, common_name, breed, location, condition, registered_by, registered_by_email, \
             register_date, rescued, rescued_by, rescued_by_email, rescue_date \
             FROM rescue_pets WHERE rescued = $1 ORDER BY register_date ASC",
        )
        .bind(rescued)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn claim_pet(&self, pet_id: Uuid, rescuer: &Actor) -> PortResult<RescuePet> {
        // The `rescued = FALSE` predicate makes the update a compare-and-set:
        // of two racing claimants only one matches the row.
        let claimed = sqlx::query_as::<_, RescuePetRecord>(
            "UPDATE rescue_pets \
             SET rescued = TRUE, rescued_by = $2, rescued_by_email = $3, rescue_date = GREATEST($4, register_date) \
             WHERE pet_id = $1 AND rescued = FALSE \
             RETURNING pet_id, common_name, breed, location, condition, registered_by, registered_by_email, \
             register_date, rescued, rescued_by, rescued_by_email, rescue_date",
        )
        .bind(pet_id)
        .bind(&rescuer.name)
        .bind(&rescuer.email)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match claimed {
            Some(record) => {
                info!(%pet_id, rescuer = %rescuer.email, "Pet rescued");
                Ok(record.to_domain())
            }
            None => {
                // Either the pet does not exist or someone else got there first.
                self.get_pet(pet_id).await?;
                warn!(%pet_id, rescuer = %rescuer.email, "Rescue claim lost to an earlier claimant");
                Err(PortError::AlreadyRescued(pet_id))
            }
        }
    }
}
