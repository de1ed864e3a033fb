//! crates/beyond_bark_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Represents an authenticated user. The display name and email are what
/// get stamped onto rescue records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub profile: Profile,
}

/// Optional personal details. Phone, birth date and gender are collected at
/// signup; the favorites and photo are filled in later from the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub favorite_animal: Option<String>,
    pub favorite_pet: Option<String>,
    pub favorite_bird: Option<String>,
    pub photo_url: Option<String>,
}

impl Profile {
    /// Merges an edit into this profile. Fields the edit leaves `None` are kept;
    /// a blank text field clears the stored value.
    pub fn apply(&mut self, edit: Profile) {
        fn merge(current: &mut Option<String>, edit: Option<String>) {
            if let Some(value) = edit {
                let value = value.trim();
                *current = (!value.is_empty()).then(|| value.to_string());
            }
        }

        merge(&mut self.phone, edit.phone);
        merge(&mut self.gender, edit.gender);
        merge(&mut self.favorite_animal, edit.favorite_animal);
        merge(&mut self.favorite_pet, edit.favorite_pet);
        merge(&mut self.favorite_bird, edit.favorite_bird);
        merge(&mut self.photo_url, edit.photo_url);
        if edit.date_of_birth.is_some() {
            self.date_of_birth = edit.date_of_birth;
        }
    }
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub hashed_password: String,
    pub profile: Profile,
}

impl UserCredentials {
    pub fn to_user(&self) -> User {
        User {
            user_id: self.user_id,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            profile: self.profile.clone(),
        }
    }
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// The identity stamped onto a record by whoever registers or rescues it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub email: String,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            name: user.display_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The fields a registrant supplies when reporting an abandoned animal.
#[derive(Debug, Clone)]
pub struct NewRescuePet {
    pub common_name: String,
    pub breed: String,
    pub location: String,
    pub condition: String,
}

/// An animal reported to the shared rescue board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescuePet {
    pub id: Uuid,
    pub common_name: String,
    pub breed: String,
    pub location: String,
    pub condition: String,
    pub registered_by: String,
    pub registered_by_email: String,
    pub register_date: DateTime<Utc>,
    pub rescued: bool,
    pub rescued_by: Option<String>,
    pub rescued_by_email: Option<String>,
    pub rescue_date: Option<DateTime<Utc>>,
}

/// Returned when a claim is attempted on a pet that already has a rescuer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Pet {pet_id} was already rescued by {rescued_by}")]
pub struct AlreadyRescued {
    pub pet_id: Uuid,
    pub rescued_by: String,
}

impl RescuePet {
    /// Creates a pet record in the unrescued state.
    pub fn register(new_pet: NewRescuePet, registrant: &Actor, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            common_name: new_pet.common_name,
            breed: new_pet.breed,
            location: new_pet.location,
            condition: new_pet.condition,
            registered_by: registrant.name.clone(),
            registered_by_email: registrant.email.clone(),
            register_date: now,
            rescued: false,
            rescued_by: None,
            rescued_by_email: None,
            rescue_date: None,
        }
    }

    /// Flips the record to rescued, stamping the rescuer and a timestamp.
    ///
    /// The transition happens at most once. A second claim is rejected rather
    /// than overwriting the first rescuer. The rescue date never precedes the
    /// registration date, even if `now` comes from a skewed clock.
    pub fn claim(&mut self, rescuer: &Actor, now: DateTime<Utc>) -> Result<(), AlreadyRescued> {
        if self.rescued {
            return Err(AlreadyRescued {
                pet_id: self.id,
                rescued_by: self.rescued_by.clone().unwrap_or_default(),
            });
        }

        self.rescued = true;
        self.rescued_by = Some(rescuer.name.clone());
        self.rescued_by_email = Some(rescuer.email.clone());
        self.rescue_date = Some(now.max(self.register_date));
        Ok(())
    }
}
