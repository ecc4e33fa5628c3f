use crate::domain::model::{Entity, EntityId, EntityKind, Offer, RealtyObject, Site};
use crate::domain::ports::EntityStore;
use crate::utils::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 已提交實體的快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub sites: Vec<Site>,
    pub objects: Vec<RealtyObject>,
    pub offers: Vec<Offer>,
}

impl StoreSnapshot {
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty() && self.objects.is_empty() && self.offers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sites.len() + self.objects.len() + self.offers.len()
    }

    fn push(&mut self, entity: Entity) {
        match entity {
            Entity::Site(site) => self.sites.push(site),
            Entity::Object(object) => self.objects.push(object),
            Entity::Offer(offer) => self.offers.push(offer),
        }
    }

    fn into_entities(self) -> impl Iterator<Item = Entity> {
        let sites = self.sites.into_iter().map(Entity::from);
        let objects = self.objects.into_iter().map(Entity::from);
        let offers = self.offers.into_iter().map(Entity::from);
        sites.chain(objects).chain(offers)
    }
}

/// Reference [`EntityStore`] keeping everything in memory.
///
/// Entities `add`ed since the last commit form one unit: `save_changes` checks the
/// unit and either applies all of it or none of it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    committed: StoreSnapshot,
    index: HashMap<EntityId, EntityKind>,
    pending: Vec<Entity>,
    next_id: EntityId,
    commits: usize,
    fail_next_commit: Option<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Continues from previously committed data; new ids follow the largest existing one.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut store = Self::new();
        store.replay(snapshot);
        store
    }

    /// Applies an already committed unit, e.g. one read back from a journal.
    ///
    /// Entities whose id is already known are ignored, so replaying a unit twice
    /// changes nothing. Returns how many entities were applied.
    pub fn replay(&mut self, unit: StoreSnapshot) -> usize {
        let mut applied = 0;
        for entity in unit.into_entities() {
            if self.index.contains_key(&entity.id()) {
                continue;
            }
            self.next_id = self.next_id.max(entity.id() + 1);
            self.apply(entity);
            applied += 1;
        }
        applied
    }

    pub fn sites(&self) -> &[Site] {
        &self.committed.sites
    }

    pub fn objects(&self) -> &[RealtyObject] {
        &self.committed.objects
    }

    pub fn offers(&self) -> &[Offer] {
        &self.committed.offers
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.committed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Makes the next `save_changes` fail with this message.
    pub fn fail_next_commit(&mut self, message: impl Into<String>) {
        self.fail_next_commit = Some(message.into());
    }

    /// Validates the pending unit and returns a copy of it without committing.
    ///
    /// On failure the unit is discarded. On success the caller must finish with
    /// [`apply_pending`](Self::apply_pending) or `discard_changes`.
    pub fn prepare_commit(&mut self) -> Result<StoreSnapshot> {
        if let Some(message) = self.fail_next_commit.take() {
            self.pending.clear();
            return Err(ImportError::persistence(message));
        }

        if let Err(e) = self.check_pending() {
            self.pending.clear();
            return Err(e);
        }

        let mut unit = StoreSnapshot::default();
        for entity in &self.pending {
            unit.push(entity.clone());
        }
        Ok(unit)
    }

    /// Makes the pending unit visible.
    pub fn apply_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for entity in pending {
            self.apply(entity);
        }
        self.commits += 1;
    }

    fn apply(&mut self, entity: Entity) {
        self.index.insert(entity.id(), entity.kind());
        self.committed.push(entity);
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn is_site(&self, id: EntityId) -> bool {
        self.index.get(&id) == Some(&EntityKind::Site)
            || self
                .pending
                .iter()
                .any(|e| matches!(e, Entity::Site(s) if s.id == id))
    }

    fn is_object(&self, id: EntityId) -> bool {
        self.index.get(&id) == Some(&EntityKind::Object)
            || self
                .pending
                .iter()
                .any(|e| matches!(e, Entity::Object(o) if o.id == id))
    }

    fn check_pending(&self) -> Result<()> {
        for entity in &self.pending {
            if let Entity::Offer(offer) = entity {
                if offer.site_offer_id.is_empty() {
                    return Err(ImportError::persistence(format!(
                        "offer #{} has no site offer id",
                        offer.id
                    )));
                }
                if offer.offer_type.is_none() {
                    return Err(ImportError::persistence(format!(
                        "offer #{} has no offer type",
                        offer.id
                    )));
                }
                match offer.site {
                    Some(site) if self.is_site(site) => {}
                    other => {
                        return Err(ImportError::persistence(format!(
                            "offer #{} references unknown site {:?}",
                            offer.id, other
                        )))
                    }
                }
                match offer.object {
                    Some(object) if self.is_object(object) => {}
                    other => {
                        return Err(ImportError::persistence(format!(
                            "offer #{} references unknown object {:?}",
                            offer.id, other
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

impl EntityStore for InMemoryStore {
    fn create_site(&mut self) -> Site {
        Site::new(self.allocate_id())
    }

    fn create_object(&mut self) -> RealtyObject {
        RealtyObject::new(self.allocate_id())
    }

    fn create_offer(&mut self) -> Offer {
        Offer::new(self.allocate_id())
    }

    fn add(&mut self, entity: Entity) -> Result<()> {
        let id = entity.id();
        if self.index.contains_key(&id) || self.pending.iter().any(|e| e.id() == id) {
            return Err(ImportError::persistence(format!(
                "{:?} #{} was already added",
                entity.kind(),
                id
            )));
        }
        self.pending.push(entity);
        Ok(())
    }

    fn save_changes(&mut self) -> Result<()> {
        self.prepare_commit()?;
        self.apply_pending();
        Ok(())
    }

    fn discard_changes(&mut self) {
        self.pending.clear();
    }
}
