//! In-memory invitation repository.

use crate::lock;
use fairdraw_core::error::StoreError;
use fairdraw_core::ids::{EntrantId, EventId};
use fairdraw_core::invitation::{Invitation, InvitationStatus};
use fairdraw_core::store::{InvitationStore, StoreFuture};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory [`InvitationStore`] implementation.
///
/// `compare_and_set_status` resolves concurrent accept/decline races to
/// exactly one winner under the store mutex.
#[derive(Default)]
pub struct InMemoryInvitationStore {
    invitations: Mutex<HashMap<(EventId, EntrantId), Invitation>>,
}

impl InMemoryInvitationStore {
    /// Create an empty invitation store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvitationStore for InMemoryInvitationStore {
    fn get(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> StoreFuture<'_, Option<Invitation>> {
        let invitation = lock(&self.invitations)
            .get(&(event_id.clone(), entrant_id.clone()))
            .cloned();
        Box::pin(async move { Ok::<_, StoreError>(invitation) })
    }

    fn create_if_absent(&self, invitation: Invitation) -> StoreFuture<'_, bool> {
        let created = {
            let mut invitations = lock(&self.invitations);
            let key = (invitation.event_id.clone(), invitation.entrant_id.clone());
            if invitations.contains_key(&key) {
                false
            } else {
                invitations.insert(key, invitation);
                true
            }
        };
        Box::pin(async move { Ok::<_, StoreError>(created) })
    }

    fn compare_and_set_status(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
        new_status: InvitationStatus,
    ) -> StoreFuture<'_, bool> {
        let resolved = lock(&self.invitations)
            .get_mut(&(event_id.clone(), entrant_id.clone()))
            .is_some_and(|invitation| invitation.resolve(new_status));
        Box::pin(async move { Ok::<_, StoreError>(resolved) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pending() -> Invitation {
        Invitation::pending(EventId::new("e1"), EntrantId::new("u1"))
    }

    #[tokio::test]
    async fn create_if_absent_is_exclusive() {
        let store = InMemoryInvitationStore::new();
        assert!(store.create_if_absent(pending()).await.unwrap());
        assert!(!store.create_if_absent(pending()).await.unwrap());
    }

    #[tokio::test]
    async fn cas_first_resolution_wins() {
        let event = EventId::new("e1");
        let entrant = EntrantId::new("u1");
        let store = InMemoryInvitationStore::new();
        store.create_if_absent(pending()).await.unwrap();

        assert!(
            store
                .compare_and_set_status(&event, &entrant, InvitationStatus::Declined)
                .await
                .unwrap()
        );
        assert!(
            !store
                .compare_and_set_status(&event, &entrant, InvitationStatus::Accepted)
                .await
                .unwrap()
        );

        let invitation = store.get(&event, &entrant).await.unwrap().unwrap();
        assert_eq!(invitation.status, InvitationStatus::Declined);
    }

    #[tokio::test]
    async fn cas_on_missing_invitation_fails() {
        let store = InMemoryInvitationStore::new();
        assert!(
            !store
                .compare_and_set_status(
                    &EventId::new("e1"),
                    &EntrantId::new("ghost"),
                    InvitationStatus::Accepted
                )
                .await
                .unwrap()
        );
    }
}
