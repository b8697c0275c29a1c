use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::AppError;

pub const MAX_TITLE_LEN: usize = 48;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAdvertisementRequest {
    #[schema(example = "Road bike")]
    pub title: String,
    #[schema(example = "Aluminium frame, 54cm, lightly used")]
    pub description: String,
    #[schema(example = 420.0)]
    pub price: f64,
}

impl CreateAdvertisementRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAdvertisementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

impl UpdateAdvertisementRequest {
    /// Applies the fields that were supplied; absent fields keep their value.
    pub fn apply_to(self, ad: &mut Advertisement) -> Result<(), AppError> {
        if let Some(title) = self.title {
            validate_title(&title)?;
            ad.title = title;
        }
        if let Some(description) = self.description {
            ad.description = description;
        }
        if let Some(price) = self.price {
            ad.price = price;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::bad_request(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

/// Advertisement columns that may be searched by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Id,
    Title,
    Description,
    Price,
    UserId,
    CreatedAt,
}

impl SearchField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "description" => Some(Self::Description),
            "price" => Some(Self::Price),
            "user_id" => Some(Self::UserId),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Description => "description",
            Self::Price => "price",
            Self::UserId => "user_id",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// A single `field=value` equality filter over advertisements.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvertisementFilter {
    pub field: SearchField,
    pub value: SearchValue,
}

impl AdvertisementFilter {
    /// Like `from_params`, but also rejects a bare `field` with no `=value`,
    /// which the decoded pairs cannot tell apart from `field=`.
    pub fn from_query(raw_query: Option<&str>, params: &[(String, String)]) -> Result<Self, AppError> {
        let bare_key = raw_query
            .unwrap_or_default()
            .split('&')
            .any(|segment| !segment.is_empty() && !segment.contains('='));
        if bare_key {
            return Err(AppError::bad_request("invalid query parameters"));
        }

        Self::from_params(params)
    }

    pub fn from_params(params: &[(String, String)]) -> Result<Self, AppError> {
        let (name, raw) = match params {
            [] => return Err(AppError::bad_request("invalid query parameters")),
            [single] => single,
            _ => return Err(AppError::bad_request("too many parameters in query string")),
        };

        let field = SearchField::parse(name)
            .ok_or_else(|| AppError::bad_request(format!("field {} does not exist", name)))?;

        let value = match field {
            SearchField::Id | SearchField::UserId => raw
                .parse::<i64>()
                .map(SearchValue::Integer)
                .map_err(|_| AppError::bad_request(format!("{} must be an integer", name)))?,
            SearchField::Price => raw
                .parse::<f64>()
                .map(SearchValue::Real)
                .map_err(|_| AppError::bad_request("price must be a number"))?,
            SearchField::CreatedAt => DateTime::parse_from_rfc3339(raw)
                .map(|at| SearchValue::Timestamp(at.with_timezone(&Utc)))
                .map_err(|_| AppError::bad_request("created_at must be an RFC 3339 timestamp"))?,
            SearchField::Title | SearchField::Description => SearchValue::Text(raw.clone()),
        };

        Ok(Self { field, value })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn filter_requires_exactly_one_parameter() {
        assert!(AdvertisementFilter::from_params(&params(&[])).is_err());
        let err = AdvertisementFilter::from_params(&params(&[("title", "a"), ("price", "1")])).unwrap_err();
        assert!(err.to_string().contains("too many"));
    }

    #[test]
    fn filter_rejects_unknown_fields() {
        let err = AdvertisementFilter::from_params(&params(&[("password", "x")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn filter_types_values_by_column() {
        let filter = AdvertisementFilter::from_params(&params(&[("user_id", "7")])).unwrap();
        assert_eq!(filter.field, SearchField::UserId);
        assert_eq!(filter.value, SearchValue::Integer(7));

        let filter = AdvertisementFilter::from_params(&params(&[("title", "bike")])).unwrap();
        assert_eq!(filter.value, SearchValue::Text("bike".to_string()));

        assert!(AdvertisementFilter::from_params(&params(&[("price", "cheap")])).is_err());
    }

    #[test]
    fn created_at_is_parsed_into_utc() {
        let filter =
            AdvertisementFilter::from_params(&params(&[("created_at", "2026-10-18T18:55:51.5+02:00")])).unwrap();
        let expected = DateTime::parse_from_rfc3339("2026-10-18T16:55:51.5Z").unwrap().with_timezone(&Utc);
        assert_eq!(filter.value, SearchValue::Timestamp(expected));

        assert!(AdvertisementFilter::from_params(&params(&[("created_at", "yesterday")])).is_err());
    }

    #[test]
    fn bare_keys_without_a_value_are_rejected() {
        let err = AdvertisementFilter::from_query(Some("title"), &params(&[("title", "")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let filter = AdvertisementFilter::from_query(Some("title="), &params(&[("title", "")])).unwrap();
        assert_eq!(filter.value, SearchValue::Text(String::new()));
    }

    #[test]
    fn update_keeps_absent_fields() {
        let mut ad = Advertisement {
            id: 1,
            title: "Road bike".to_string(),
            description: "lightly used".to_string(),
            price: 420.0,
            user_id: 3,
            created_at: Utc::now(),
        };
        let update = UpdateAdvertisementRequest {
            price: Some(380.0),
            ..Default::default()
        };
        update.apply_to(&mut ad).unwrap();
        assert_eq!(ad.price, 380.0);
        assert_eq!(ad.title, "Road bike");
    }

    #[test]
    fn long_titles_are_rejected() {
        let mut ad = Advertisement {
            id: 1,
            title: "t".to_string(),
            description: "d".to_string(),
            price: 1.0,
            user_id: 1,
            created_at: Utc::now(),
        };
        let update = UpdateAdvertisementRequest {
            title: Some("x".repeat(MAX_TITLE_LEN + 1)),
            ..Default::default()
        };
        assert!(update.apply_to(&mut ad).is_err());
        assert_eq!(ad.title, "t");
    }
}
