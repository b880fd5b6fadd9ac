//! Payment cards. The Luhn-checked number is sealed; its mask is the
//! searchable display field.

use std::sync::Arc;

use common::protocol::{CardAddRequest, CardItem, CardSecret, SearchRequest, SearchResponse};
use tracing::info;
use uuid::Uuid;

use super::{parse_id, search_query, SecretError};
use crate::crypto::FieldCipher;
use crate::storage::{CardStore, SealedCard};
use crate::sync::SyncTracker;
use crate::validation::CreditCard;

#[derive(Clone)]
pub struct CardService {
    store: Arc<dyn CardStore>,
    cipher: FieldCipher,
    sync: SyncTracker,
}

impl CardService {
    pub fn new(store: Arc<dyn CardStore>, cipher: FieldCipher, sync: SyncTracker) -> Self {
        Self {
            store,
            cipher,
            sync,
        }
    }

    /// Validate a card, seal number, CVC and PIN, and store it with its mask.
    ///
    /// # Errors
    ///
    /// [`SecretError::Validation`] when the card fails validation (month,
    /// year, CVC, PIN or Luhn check); [`SecretError::Cipher`] or
    /// [`SecretError::Storage`] when sealing or the insert fails.
    pub async fn add(&self, owner: Uuid, req: CardAddRequest) -> Result<Uuid, SecretError> {
        let card = CreditCard::new(&req.number, req.month, req.year, &req.cvc, &req.pin);
        card.validate()
            .map_err(|e| SecretError::validation(e.to_string()))?;

        let sealed = SealedCard {
            name: req.name,
            mask: card.mask(),
            number: self.cipher.encrypt_str(&card.number)?,
            month: card.month,
            year: card.year,
            cvc: self.cipher.encrypt_str(&card.cvc)?,
            pin: self.cipher.encrypt_str(&card.pin)?,
        };
        let id = self.store.add(owner, sealed).await?;
        self.sync.notify(owner).await;

        info!(owner_id = %owner, id = %id, "card added");
        Ok(id)
    }

    /// Fetch and unseal one of `owner`'s cards.
    ///
    /// # Errors
    ///
    /// [`SecretError::NotFound`] for an unknown or foreign id;
    /// [`SecretError::Cipher`] when a stored field fails verification.
    pub async fn get_secret(&self, owner: Uuid, id: &str) -> Result<CardSecret, SecretError> {
        let id = parse_id(id)?;
        let sealed = self.store.get(owner, id).await?;
        Ok(CardSecret {
            number: self.cipher.decrypt_str(&sealed.number)?,
            cvc: self.cipher.decrypt_str(&sealed.cvc)?,
            pin: self.cipher.decrypt_str(&sealed.pin)?,
            name: sealed.name,
            month: sealed.month,
            year: sealed.year,
        })
    }

    /// Search `owner`'s cards by name or mask.
    ///
    /// # Errors
    ///
    /// [`SecretError::Validation`] for a zero limit.
    pub async fn search(
        &self,
        owner: Uuid,
        req: SearchRequest,
    ) -> Result<SearchResponse<CardItem>, SecretError> {
        let query = search_query(req)?;
        Ok(self.store.search(owner, &query).await?.into())
    }

    /// Delete one of `owner`'s cards.
    ///
    /// # Errors
    ///
    /// [`SecretError::NotFound`] for an unknown or foreign id.
    pub async fn remove(&self, owner: Uuid, id: &str) -> Result<Uuid, SecretError> {
        let id = parse_id(id)?;
        self.store.remove(owner, id).await?;
        self.sync.notify(owner).await;

        info!(owner_id = %owner, id = %id, "card removed");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_key;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::{MockCardStore, MockSyncStore};

    fn request(number: &str, month: i32, year: i32, cvc: &str, pin: &str) -> CardAddRequest {
        CardAddRequest {
            name: "visa".into(),
            number: number.into(),
            month,
            year,
            cvc: cvc.into(),
            pin: pin.into(),
        }
    }

    #[tokio::test]
    async fn rejected_card_is_never_stored() {
        let svc = CardService::new(
            Arc::new(MockCardStore::new()),
            FieldCipher::new(test_key()),
            SyncTracker::new(Arc::new(MockSyncStore::new())),
        );
        let owner = Uuid::new_v4();
        for req in [
            request("4242424242424241", 12, 2030, "123", "1234"),
            request("4242424242424242", 13, 2030, "123", "1234"),
            request("4242424242424242", 12, 1969, "123", "1234"),
            request("4242424242424242", 12, 2030, "12", "1234"),
            request("4242424242424242", 12, 2030, "123", "123"),
        ] {
            assert!(matches!(
                svc.add(owner, req).await,
                Err(SecretError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn stored_row_holds_mask_and_sealed_digits() {
        let mut store = MockCardStore::new();
        store
            .expect_add()
            .times(1)
            .withf(|_, c| {
                c.mask == "**** **** **** 4242"
                    && !c.number.contains("4242")
                    && c.cvc != "123"
                    && c.pin != "1234"
                    && c.month == 12
                    && c.year == 2030
            })
            .returning(|_, _| Ok(Uuid::new_v4()));
        let mut sync = MockSyncStore::new();
        sync.expect_set().times(1).returning(|_| Ok(()));

        let svc = CardService::new(
            Arc::new(store),
            FieldCipher::new(test_key()),
            SyncTracker::new(Arc::new(sync)),
        );
        svc.add(
            Uuid::new_v4(),
            request("4242 4242 4242 4242", 12, 2030, "123", "1234"),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn round_trip_and_search_by_mask() {
        let storage = Arc::new(MemoryStorage::new());
        let svc = CardService::new(
            storage.clone(),
            FieldCipher::new(test_key()),
            SyncTracker::new(storage),
        );
        let owner = Uuid::new_v4();

        let id = svc
            .add(owner, request("4242424242424242", 12, 2030, "123", "1234"))
            .await
            .unwrap()
            .to_string();

        let secret = svc.get_secret(owner, &id).await.unwrap();
        assert_eq!(secret.number, "4242424242424242");
        assert_eq!(secret.cvc, "123");
        assert_eq!(secret.pin, "1234");

        let found = svc
            .search(
                owner,
                SearchRequest {
                    substring: "4242".into(),
                    offset: 0,
                    limit: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(found.count, 1);
        assert_eq!(found.items[0].mask, "**** **** **** 4242");

        assert!(matches!(
            svc.get_secret(Uuid::new_v4(), &id).await,
            Err(SecretError::NotFound)
        ));
    }
}
