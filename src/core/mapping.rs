//! Feed vocabulary tables.
//!
//! Every enumeration family has one fixed table from the publisher's (Russian)
//! term to a domain value. Lookups are exact and strict: an unknown term is an
//! error, never a default.

use crate::core::listing::ListingRecord;
use crate::domain::model::{Area, AreaUnit, BuildingType, Category, OfferKind, PropertyType};
use crate::utils::error::{ImportError, Result};

pub trait FeedTerm: Copy + Sized + 'static {
    /// Human readable family name used in lookup errors.
    const FAMILY: &'static str;
    /// Tag read when the caller does not override it.
    const DEFAULT_TAG: &'static str;
    const TABLE: &'static [(&'static str, Self)];

    fn from_feed_term(term: &str) -> Result<Self> {
        Self::TABLE
            .iter()
            .find(|(known, _)| *known == term)
            .map(|(_, value)| *value)
            .ok_or_else(|| ImportError::lookup(Self::FAMILY, term))
    }
}

impl FeedTerm for OfferKind {
    const FAMILY: &'static str = "offer kind";
    const DEFAULT_TAG: &'static str = "type";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("продажа", OfferKind::Sale),
        ("аренда", OfferKind::Rent),
        ("покупка", OfferKind::Purchase),
    ];
}

impl FeedTerm for AreaUnit {
    const FAMILY: &'static str = "area unit";
    const DEFAULT_TAG: &'static str = "unit";
    const TABLE: &'static [(&'static str, Self)] = &[("кв.м", AreaUnit::SquareMeters)];
}

impl FeedTerm for BuildingType {
    const FAMILY: &'static str = "building type";
    const DEFAULT_TAG: &'static str = "building-type";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("кирпичный", BuildingType::Brick),
        ("кирпично-монолитный", BuildingType::BrickMonolith),
        ("монолитный", BuildingType::Monolith),
        ("панельный", BuildingType::Panel),
        ("пенобетонный", BuildingType::FoamConcrete),
    ];
}

impl FeedTerm for PropertyType {
    const FAMILY: &'static str = "property type";
    const DEFAULT_TAG: &'static str = "property-type";
    const TABLE: &'static [(&'static str, Self)] = &[("жилая", PropertyType::Living)];
}

impl FeedTerm for Category {
    const FAMILY: &'static str = "category";
    const DEFAULT_TAG: &'static str = "category";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("Комната", Category::Room),
        ("Квартира", Category::Flat),
        ("Дом", Category::House),
    ];
}

pub const AREA_TAG: &str = "area";
pub const AREA_VALUE_TAG: &str = "value";
pub const URL_TAG: &str = "url";

/// Reads `tag` from the listing and maps it through `T`'s table.
pub fn map_field<T: FeedTerm>(listing: &ListingRecord<'_>, tag: &str) -> Result<T> {
    let term = listing.text(tag)?;
    T::from_feed_term(&term)
}

/// Like [`map_field`], but an absent element is `None` instead of an error.
pub fn map_optional_field<T: FeedTerm>(listing: &ListingRecord<'_>, tag: &str) -> Result<Option<T>> {
    match listing.optional_text(tag) {
        Some(term) => T::from_feed_term(&term).map(Some),
        None => Ok(None),
    }
}

pub fn offer_kind(listing: &ListingRecord<'_>) -> Result<OfferKind> {
    offer_kind_with_tag(listing, OfferKind::DEFAULT_TAG)
}

pub fn offer_kind_with_tag(listing: &ListingRecord<'_>, tag: &str) -> Result<OfferKind> {
    map_field(listing, tag)
}

pub fn property_type(listing: &ListingRecord<'_>) -> Result<PropertyType> {
    property_type_with_tag(listing, PropertyType::DEFAULT_TAG)
}

pub fn property_type_with_tag(listing: &ListingRecord<'_>, tag: &str) -> Result<PropertyType> {
    map_field(listing, tag)
}

pub fn category(listing: &ListingRecord<'_>) -> Result<Category> {
    category_with_tag(listing, Category::DEFAULT_TAG)
}

pub fn category_with_tag(listing: &ListingRecord<'_>, tag: &str) -> Result<Category> {
    map_field(listing, tag)
}

pub fn building_type(listing: &ListingRecord<'_>) -> Result<BuildingType> {
    building_type_with_tag(listing, BuildingType::DEFAULT_TAG)
}

pub fn building_type_with_tag(listing: &ListingRecord<'_>, tag: &str) -> Result<BuildingType> {
    map_field(listing, tag)
}

/// Unit of an `area` section (the view returned by `listing.section("area")`).
pub fn area_unit(area: &ListingRecord<'_>) -> Result<AreaUnit> {
    area_unit_with_tag(area, AreaUnit::DEFAULT_TAG)
}

pub fn area_unit_with_tag(area: &ListingRecord<'_>, tag: &str) -> Result<AreaUnit> {
    map_field(area, tag)
}

/// `<area><value>54,5</value><unit>кв.м</unit></area>`; `None` when the listing has no area.
pub fn area(listing: &ListingRecord<'_>) -> Result<Option<Area>> {
    let Some(section) = listing.section(AREA_TAG) else {
        return Ok(None);
    };

    let raw = section.text(AREA_VALUE_TAG)?;
    let value = raw
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| ImportError::format(format!("invalid area value '{}'", raw)))?;

    Ok(Some(Area {
        value,
        unit: area_unit(&section)?,
    }))
}

pub fn url(listing: &ListingRecord<'_>) -> Result<String> {
    listing.text(URL_TAG)
}
