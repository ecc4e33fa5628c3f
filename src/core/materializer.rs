use crate::core::listing::ListingRecord;
use crate::core::mapping::{self, FeedTerm};
use crate::domain::model::{BuildingType, EntityId, Offer, RealtyObject};
use crate::domain::ports::EntityStore;
use crate::utils::error::{ImportError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const CREATION_DATE_TAG: &str = "creation-date";
pub const LAST_UPDATE_DATE_TAG: &str = "last-update-date";

/// 一筆刊登對應的兩個實體，尚未送交儲存
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntities {
    pub object: RealtyObject,
    pub offer: Offer,
}

/// Builds the Object and Offer for one listing.
///
/// Every field is mapped before anything is handed to the store, so a listing that
/// fails here leaves nothing pending.
pub fn materialize(
    listing: &ListingRecord<'_>,
    site_id: EntityId,
    store: &mut dyn EntityStore,
) -> Result<ListingEntities> {
    let mut object = store.create_object();
    object.property_type = Some(mapping::property_type(listing)?);
    object.category = Some(mapping::category(listing)?);
    object.url = Some(mapping::url(listing)?);
    object.area = mapping::area(listing)?;
    object.building_type = mapping::map_optional_field(listing, BuildingType::DEFAULT_TAG)?;

    let mut offer = store.create_offer();
    offer.site_offer_id = listing.internal_id()?.to_string();
    offer.offer_type = Some(mapping::offer_kind(listing)?);
    offer.object = Some(object.id);
    offer.site = Some(site_id);
    offer.created_at = feed_date(listing, CREATION_DATE_TAG)?;
    offer.updated_at = feed_date(listing, LAST_UPDATE_DATE_TAG)?;

    Ok(ListingEntities { object, offer })
}

/// Submits both entities as one unit and commits it.
pub fn commit(store: &mut dyn EntityStore, entities: ListingEntities) -> Result<()> {
    let staged = store
        .add(entities.object.into())
        .and_then(|_| store.add(entities.offer.into()));

    if let Err(e) = staged {
        store.discard_changes();
        return Err(e);
    }

    store.save_changes()
}

fn feed_date(listing: &ListingRecord<'_>, tag: &str) -> Result<Option<DateTime<Utc>>> {
    match listing.optional_text(tag) {
        Some(text) => parse_feed_date(&text)
            .map(Some)
            .ok_or_else(|| ImportError::format(format!("invalid date in '{}': '{}'", tag, text))),
        None => Ok(None),
    }
}

/// Accepts RFC 3339, a local `YYYY-MM-DDTHH:MM:SS` timestamp (taken as UTC) or a bare date.
pub fn parse_feed_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Some(date_time.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::InMemoryStore;
    use crate::core::archive::DocumentOrigin;
    use crate::core::document::{FeedDocument, REALTY_NAMESPACE};
    use crate::core::listing::listings;
    use crate::domain::model::{Category, OfferKind, PropertyType};
    use chrono::TimeZone;

    fn document(body: &str) -> FeedDocument {
        let xml = format!(r#"<realty-feed xmlns="{}">{}</realty-feed>"#, REALTY_NAMESPACE, body);
        FeedDocument::parse(&xml, DocumentOrigin::Plain).unwrap()
    }

    #[test]
    fn test_materialize_full_listing() {
        let document = document(
            r#"<offer internal-id="A">
                 <type>продажа</type>
                 <property-type>жилая</property-type>
                 <category>Квартира</category>
                 <url>http://atlantnt.ru/a</url>
                 <creation-date>2016-05-01T10:00:00+03:00</creation-date>
                 <building-type>панельный</building-type>
               </offer>"#,
        );
        let listing = listings(&document, REALTY_NAMESPACE).next().unwrap();
        let mut store = InMemoryStore::new();

        let entities = materialize(&listing, 7, &mut store).unwrap();
        assert_eq!(entities.object.property_type, Some(PropertyType::Living));
        assert_eq!(entities.object.category, Some(Category::Flat));
        assert_eq!(entities.object.url.as_deref(), Some("http://atlantnt.ru/a"));
        assert_eq!(entities.object.building_type, Some(BuildingType::Panel));
        assert_eq!(entities.offer.site_offer_id, "A");
        assert_eq!(entities.offer.offer_type, Some(OfferKind::Sale));
        assert_eq!(entities.offer.object, Some(entities.object.id));
        assert_eq!(entities.offer.site, Some(7));
        assert_eq!(
            entities.offer.created_at,
            Some(Utc.with_ymd_and_hms(2016, 5, 1, 7, 0, 0).unwrap())
        );
        assert_eq!(entities.offer.updated_at, None);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_bad_date_is_format_error() {
        let document = document(
            r#"<offer internal-id="A"><type>аренда</type><property-type>жилая</property-type>
               <category>Дом</category><url>u</url><last-update-date>вчера</last-update-date></offer>"#,
        );
        let listing = listings(&document, REALTY_NAMESPACE).next().unwrap();
        let result = materialize(&listing, 1, &mut InMemoryStore::new());
        assert!(matches!(result, Err(ImportError::FormatError { .. })));
    }

    #[test]
    fn test_parse_feed_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2016, 5, 10, 0, 0, 0).unwrap();
        assert_eq!(parse_feed_date("2016-05-10"), Some(midnight));
        assert_eq!(parse_feed_date("2016-05-10T00:00:00"), Some(midnight));
        assert_eq!(parse_feed_date("2016-05-10T03:00:00+03:00"), Some(midnight));
        assert_eq!(parse_feed_date("10.05.2016"), None);
    }
}
