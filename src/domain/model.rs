use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type EntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferKind {
    Sale,
    Rent,
    Purchase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaUnit {
    SquareMeters,
}

/// 建築材料
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    Brick,
    BrickMonolith,
    Monolith,
    Panel,
    FoamConcrete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Living,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Room,
    Flat,
    House,
}

macro_rules! display_as_debug {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        })+
    };
}

display_as_debug!(OfferKind, AreaUnit, BuildingType, PropertyType, Category);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub value: f64,
    pub unit: AreaUnit,
}

/// 刊登物件的來源網站
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: EntityId,
    pub name: String,
    pub url: String,
}

/// 實體不動產（與廣告無關）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtyObject {
    pub id: EntityId,
    pub property_type: Option<PropertyType>,
    pub category: Option<Category>,
    pub url: Option<String>,
    pub area: Option<Area>,
    pub building_type: Option<BuildingType>,
}

/// 某網站對某物件的一則廣告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: EntityId,
    /// Identifier the publishing site assigned to the listing (`internal-id`).
    pub site_offer_id: String,
    pub offer_type: Option<OfferKind>,
    pub site: Option<EntityId>,
    pub object: Option<EntityId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Site {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            name: String::new(),
            url: String::new(),
        }
    }
}

impl RealtyObject {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            property_type: None,
            category: None,
            url: None,
            area: None,
            building_type: None,
        }
    }
}

impl Offer {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            site_offer_id: String::new(),
            offer_type: None,
            site: None,
            object: None,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Site,
    Object,
    Offer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Site(Site),
    Object(RealtyObject),
    Offer(Offer),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Site(site) => site.id,
            Entity::Object(object) => object.id,
            Entity::Offer(offer) => offer.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Site(_) => EntityKind::Site,
            Entity::Object(_) => EntityKind::Object,
            Entity::Offer(_) => EntityKind::Offer,
        }
    }
}

impl From<Site> for Entity {
    fn from(site: Site) -> Self {
        Entity::Site(site)
    }
}

impl From<RealtyObject> for Entity {
    fn from(object: RealtyObject) -> Self {
        Entity::Object(object)
    }
}

impl From<Offer> for Entity {
    fn from(offer: Offer) -> Self {
        Entity::Offer(offer)
    }
}
