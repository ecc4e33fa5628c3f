use crate::domain::model::{Entity, Offer, RealtyObject, Site};
use crate::utils::error::Result;

/// 持久化協作者：負責分配 id 並決定提交的原子性
///
/// `create_*` only hands out a blank entity with its identity assigned; nothing
/// becomes visible until it is `add`ed and the unit is committed with
/// `save_changes`.
pub trait EntityStore {
    fn create_site(&mut self) -> Site;
    fn create_object(&mut self) -> RealtyObject;
    fn create_offer(&mut self) -> Offer;

    /// Stages an entity in the pending unit of work.
    fn add(&mut self, entity: Entity) -> Result<()>;

    /// Commits the pending unit. A rejected commit leaves nothing of the unit visible.
    fn save_changes(&mut self) -> Result<()>;

    /// Drops whatever is pending without committing it.
    fn discard_changes(&mut self);
}
