// Admin-curated catalog
// Investment opportunities (sold in units) and investor news

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url regex compiles"));

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 35;

fn validate_title(title: &str) -> Result<(), String> {
    let len = title.trim().chars().count();
    if len < TITLE_MIN {
        return Err(format!("Title must have at least {} characters.", TITLE_MIN));
    }
    if len > TITLE_MAX {
        return Err(format!("Title must have at most {} characters.", TITLE_MAX));
    }
    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), String> {
    if URL_RE.is_match(value.trim()) {
        Ok(())
    } else {
        Err(format!("{} must be a valid url", field))
    }
}

fn validate_non_negative(field: &str, value: Decimal) -> Result<(), String> {
    if value < Decimal::ZERO {
        Err(format!("{} cannot be negative", field))
    } else {
        Ok(())
    }
}

/// A product investors buy in units; `amount` is the current unit price
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: Uuid,
    pub title: String,
    pub amount: Decimal,
    pub old_amount: Option<Decimal>,
    pub image: String,
    pub growth_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Opportunity {
    /// Expected growth as a fraction, zero when unset
    pub fn growth(&self) -> Decimal {
        self.growth_rate.unwrap_or(Decimal::ZERO)
    }
}

/// `{label, value}` pair used by the frontend's product picker
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OpportunityTitle {
    pub label: String,
    pub value: Decimal,
}

/// Body of `POST /investor-opportunities`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOpportunity {
    pub title: String,
    pub amount: Decimal,
    pub image: String,
    pub growth_rate: Option<Decimal>,
}

impl NewOpportunity {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_non_negative("amount", self.amount)?;
        validate_url("image", &self.image)?;
        if let Some(rate) = self.growth_rate {
            validate_non_negative("growth rate", rate)?;
        }
        Ok(())
    }

    pub fn into_opportunity(self) -> Opportunity {
        let now = Utc::now();
        Opportunity {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            amount: self.amount,
            old_amount: None,
            image: self.image.trim().to_string(),
            growth_rate: self.growth_rate,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `PATCH /investor-opportunities/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityPatch {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub image: Option<String>,
    pub growth_rate: Option<Decimal>,
}

impl OpportunityPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(amount) = self.amount {
            validate_non_negative("amount", amount)?;
        }
        if let Some(image) = &self.image {
            validate_url("image", image)?;
        }
        if let Some(rate) = self.growth_rate {
            validate_non_negative("growth rate", rate)?;
        }
        Ok(())
    }

    /// Applies the patch; a price change keeps the previous price in `old_amount`
    pub fn apply(&self, opportunity: &mut Opportunity) {
        if let Some(title) = &self.title {
            opportunity.title = title.trim().to_string();
        }
        if let Some(amount) = self.amount {
            if amount != opportunity.amount {
                opportunity.old_amount = Some(opportunity.amount);
                opportunity.amount = amount;
            }
        }
        if let Some(image) = &self.image {
            opportunity.image = image.trim().to_string();
        }
        if let Some(rate) = self.growth_rate {
            opportunity.growth_rate = Some(rate);
        }
        opportunity.updated_at = Utc::now();
    }
}

/// Market news shown on the investor dashboard
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub source: Option<String>,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNews {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub source: Option<String>,
    pub image: String,
}

impl NewNews {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        if let Some(link) = &self.link {
            validate_url("link", link)?;
        }
        validate_url("image", &self.image)
    }

    pub fn into_news(self) -> News {
        let now = Utc::now();
        News {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description,
            link: self.link,
            source: self.source,
            image: self.image.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub source: Option<String>,
    pub image: Option<String>,
}

impl NewsPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(link) = &self.link {
            validate_url("link", link)?;
        }
        if let Some(image) = &self.image {
            validate_url("image", image)?;
        }
        Ok(())
    }

    pub fn apply(&self, news: &mut News) {
        if let Some(title) = &self.title {
            news.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            news.description = description.clone();
        }
        if let Some(link) = &self.link {
            news.link = Some(link.clone());
        }
        if let Some(source) = &self.source {
            news.source = Some(source.clone());
        }
        if let Some(image) = &self.image {
            news.image = image.trim().to_string();
        }
        news.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maize() -> NewOpportunity {
        NewOpportunity {
            title: "Maize Farm".to_string(),
            amount: Decimal::from(1500),
            image: "https://cdn.example.com/maize.png".to_string(),
            growth_rate: Some(Decimal::new(25, 2)),
        }
    }

    #[test]
    fn valid_opportunity() {
        assert!(maize().validate().is_ok());
    }

    #[test]
    fn opportunity_title_bounds() {
        let mut input = maize();
        input.title = "ab".to_string();
        assert!(input.validate().is_err());
        input.title = "x".repeat(36);
        assert!(input.validate().is_err());
    }

    #[test]
    fn opportunity_rejects_negative_amount_and_bad_image() {
        let mut input = maize();
        input.amount = Decimal::from(-1);
        assert!(input.validate().is_err());

        let mut input = maize();
        input.image = "not a url".to_string();
        assert_eq!(input.validate().unwrap_err(), "image must be a valid url");
    }

    #[test]
    fn price_change_remembers_old_amount() {
        let mut opportunity = maize().into_opportunity();
        OpportunityPatch {
            amount: Some(Decimal::from(1800)),
            ..OpportunityPatch::default()
        }
        .apply(&mut opportunity);

        assert_eq!(opportunity.amount, Decimal::from(1800));
        assert_eq!(opportunity.old_amount, Some(Decimal::from(1500)));
    }

    #[test]
    fn news_link_is_optional_but_must_be_url() {
        let mut news = NewNews {
            title: "Harvest report".to_string(),
            description: "Yields are up".to_string(),
            link: None,
            source: None,
            image: "https://cdn.example.com/news.png".to_string(),
        };
        assert!(news.validate().is_ok());

        news.link = Some("ftp:/broken".to_string());
        assert_eq!(news.validate().unwrap_err(), "link must be a valid url");
    }
}
