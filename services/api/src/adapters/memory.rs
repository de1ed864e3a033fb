//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the storage ports, used when no database is
//! configured. Each collection sits behind its own lock; a rescue claim checks
//! and writes while holding the pets lock, so concurrent claims serialize.

use async_trait::async_trait;
use beyond_bark_core::domain::{
    Actor, AuthSession, NewRescuePet, Profile, RescuePet, User, UserCredentials,
};
use beyond_bark_core::ports::{PortError, PortResult, RescueStore, UserStore};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserCredentials>>,
    sessions: Mutex<HashMap<String, AuthSession>>,
    pets: Mutex<HashMap<Uuid, RescuePet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user_with_email(
        &self,
        display_name: &str,
        email: &str,
        hashed_password: &str,
        profile: &Profile,
    ) -> PortResult<User> {
        let mut users = self.users.lock().await;
        if users.contains_key(email) {
            return Err(PortError::Conflict(format!(
                "An account for {} already exists",
                email
            )));
        }
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            profile: profile.clone(),
        };
        let user = credentials.to_user();
        users.insert(email.to_string(), credentials);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.users
            .lock()
            .await
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: &str,
        profile: &Profile,
    ) -> PortResult<User> {
        let mut users = self.users.lock().await;
        let credentials = users
            .values_mut()
            .find(|credentials| credentials.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        credentials.display_name = display_name.to_string();
        credentials.profile = profile.clone();
        Ok(credentials.to_user())
    }

    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()> {
        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str, now: DateTime<Utc>) -> PortResult<User> {
        let user_id = {
            let mut sessions = self.sessions.lock().await;
            match sessions.get(session_id).map(|s| (s.user_id, s.expires_at)) {
                Some((user_id, expires_at)) if expires_at > now => user_id,
                Some(_) => {
                    sessions.remove(session_id);
                    return Err(PortError::Unauthorized);
                }
                None => return Err(PortError::Unauthorized),
            }
        };

        self.users
            .lock()
            .await
            .values()
            .find(|credentials| credentials.user_id == user_id)
            .map(UserCredentials::to_user)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.lock().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl RescueStore for MemoryStore {
    async fn register_pet(&self, pet: NewRescuePet, registrant: &Actor) -> PortResult<RescuePet> {
        let pet = RescuePet::register(pet, registrant, Utc::now());
        self.pets.lock().await.insert(pet.id, pet.clone());
        info!(pet_id = %pet.id, "Registered pet for rescue");
        Ok(pet)
    }

    async fn get_pet(&self, pet_id: Uuid) -> PortResult<RescuePet> {
        self.pets
            .lock()
            .await
            .get(&pet_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Pet {} not found", pet_id)))
    }

    async fn list_pets(&self, rescued: bool) -> PortResult<Vec<RescuePet>> {
        let mut pets: Vec<RescuePet> = self
            .pets
            .lock()
            .await
            .values()
            .filter(|pet| pet.rescued == rescued)
            .cloned()
            .collect();
        pets.sort_by_key(|pet| pet.register_date);
        Ok(pets)
    }

    async fn claim_pet(&self, pet_id: Uuid, rescuer: &Actor) -> PortResult<RescuePet> {
        let mut pets = self.pets.lock().await;
        let pet = pets
            .get_mut(&pet_id)
            .ok_or_else(|| PortError::NotFound(format!("Pet {} not found", pet_id)))?;

        match pet.claim(rescuer, Utc::now()) {
            Ok(()) => {
                info!(%pet_id, rescuer = %rescuer.email, "Pet rescued");
                Ok(pet.clone())
            }
            Err(lost) => {
                warn!(%pet_id, rescuer = %rescuer.email, "{}", lost);
                Err(PortError::AlreadyRescued(pet_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn actor(name: &str) -> Actor {
        Actor {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn stray(name: &str) -> NewRescuePet {
        NewRescuePet {
            common_name: name.to_string(),
            breed: "Mixed".to_string(),
            location: "Riverside".to_string(),
            condition: "Hungry".to_string(),
        }
    }

    #[tokio::test]
    async fn rescue_moves_pet_between_lists() {
        let store = MemoryStore::new();
        let pet = store.register_pet(stray("Dog"), &actor("Sam")).await.unwrap();

        assert_eq!(store.list_pets(false).await.unwrap().len(), 1);
        assert!(store.list_pets(true).await.unwrap().is_empty());

        let rescued = store.claim_pet(pet.id, &actor("Alex")).await.unwrap();
        assert!(rescued.rescued);
        assert_eq!(rescued.rescued_by.as_deref(), Some("Alex"));
        assert_eq!(rescued.rescued_by_email.as_deref(), Some("alex@example.com"));
        assert!(rescued.rescue_date.unwrap() >= rescued.register_date);

        assert!(store.list_pets(false).await.unwrap().is_empty());
        assert_eq!(store.list_pets(true).await.unwrap()[0].id, pet.id);
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let pet = store.register_pet(stray("Cat"), &actor("Sam")).await.unwrap();
        let pet_id = pet.id;

        let claims: Vec<_> = ["Alex", "Jo", "Kim", "Lee"]
            .into_iter()
            .map(|name| {
                let store = store.clone();
                tokio::spawn(async move { store.claim_pet(pet_id, &actor(name)).await })
            })
            .collect();

        let mut winners = Vec::new();
        let mut losers = 0;
        for claim in claims {
            match claim.await.unwrap() {
                Ok(pet) => winners.push(pet.rescued_by.unwrap()),
                Err(PortError::AlreadyRescued(id)) => {
                    assert_eq!(id, pet.id);
                    losers += 1;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(losers, 3);
        let stored = store.get_pet(pet.id).await.unwrap();
        assert_eq!(stored.rescued_by.as_ref(), Some(&winners[0]));
    }

    #[tokio::test]
    async fn claiming_unknown_pet_is_not_found() {
        let store = MemoryStore::new();
        let err = store.claim_pet(Uuid::new_v4(), &actor("Alex")).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn sessions_expire_and_can_be_deleted() {
        let store = MemoryStore::new();
        let user = store
            .create_user_with_email("Alex", "alex@example.com", "hash", &Profile::default())
            .await
            .unwrap();
        let now = Utc::now();
        store
            .create_auth_session(AuthSession {
                id: "live".to_string(),
                user_id: user.user_id,
                expires_at: now + Duration::days(1),
            })
            .await
            .unwrap();
        store
            .create_auth_session(AuthSession {
                id: "stale".to_string(),
                user_id: user.user_id,
                expires_at: now - Duration::seconds(1),
            })
            .await
            .unwrap();

        assert_eq!(store.validate_auth_session("live", now).await.unwrap(), user);
        assert!(matches!(
            store.validate_auth_session("stale", now).await,
            Err(PortError::Unauthorized)
        ));
        assert!(!store.sessions.lock().await.contains_key("stale"));

        store.delete_auth_session("live").await.unwrap();
        assert!(matches!(
            store.validate_auth_session("live", now).await,
            Err(PortError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store
            .create_user_with_email("Alex", "alex@example.com", "hash", &Profile::default())
            .await
            .unwrap();
        let err = store
            .create_user_with_email("Alex Two", "alex@example.com", "hash", &Profile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn profile_update_is_visible_through_sessions() {
        let store = MemoryStore::new();
        let signup = Profile {
            phone: Some("555-0100".to_string()),
            ..Profile::default()
        };
        let user = store
            .create_user_with_email("Alex", "alex@example.com", "hash", &signup)
            .await
            .unwrap();
        assert_eq!(user.profile.phone.as_deref(), Some("555-0100"));

        let edited = Profile {
            favorite_pet: Some("Rex".to_string()),
            ..signup
        };
        let updated = store
            .update_profile(user.user_id, "Alex B", &edited)
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Alex B");

        let now = Utc::now();
        store
            .create_auth_session(AuthSession {
                id: "s1".to_string(),
                user_id: user.user_id,
                expires_at: now + Duration::hours(1),
            })
            .await
            .unwrap();
        let seen = store.validate_auth_session("s1", now).await.unwrap();
        assert_eq!(seen.profile, edited);
        assert_eq!(
            store.get_user_by_email("alex@example.com").await.unwrap().display_name,
            "Alex B"
        );

        let err = store
            .update_profile(Uuid::new_v4(), "Nobody", &Profile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
