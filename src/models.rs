use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;
pub const DEFAULT_LEAD_SOURCE: &str = "Website";

/// The four proxied YGL operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    RentalSearch,
    AgentSearch,
    LandlordSearch,
    LeadCreate,
}

impl Endpoint {
    /// Path this endpoint is served on.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::RentalSearch => "/api/rentals/search",
            Endpoint::AgentSearch => "/api/agents/search",
            Endpoint::LandlordSearch => "/api/landlords/search",
            Endpoint::LeadCreate => "/api/leads",
        }
    }

    /// Path relative to the YGL base URL.
    pub fn upstream_path(&self) -> &'static str {
        match self {
            Endpoint::RentalSearch => "rentals/search.php",
            Endpoint::AgentSearch => "agents/search.php",
            Endpoint::LandlordSearch => "landlords/search.php",
            Endpoint::LeadCreate => "leads/create.php",
        }
    }

    /// Lead creation has side effects upstream and is never cached.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Endpoint::LeadCreate)
    }
}

// ============ Request Bodies (as received) ============

/// Body of `POST /api/rentals/search` before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RentalSearchBody {
    pub beds_min: Option<i64>,
    pub beds_max: Option<i64>,
    pub baths_min: Option<f64>,
    pub baths_max: Option<f64>,
    pub rent_min: Option<i64>,
    pub rent_max: Option<i64>,
    pub neighborhoods: Option<Vec<String>>,
    pub availability_start: Option<String>,
    pub availability_end: Option<String>,
    pub fee: Option<String>,
    pub keyword: Option<String>,
    pub order_by: Option<String>,
    pub include_photos: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Body of `POST /api/agents/search` before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSearchBody {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub active_only: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Body of `POST /api/landlords/search` before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandlordSearchBody {
    pub landlord_ids: Option<Vec<String>>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Body of `POST /api/leads` before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeadBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
}

// ============ Validated Requests ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fee {
    Any,
    NoFee,
    Fee,
}

impl FromStr for Fee {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Fee::Any),
            "no_fee" => Ok(Fee::NoFee),
            "fee" => Ok(Fee::Fee),
            _ => Err(()),
        }
    }
}

impl Fee {
    pub const VARIANTS: &'static [&'static str] = &["any", "no_fee", "fee"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Fee::Any => "any",
            Fee::NoFee => "no_fee",
            Fee::Fee => "fee",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    RentAsc,
    RentDesc,
    DateDesc,
    DateAsc,
}

impl FromStr for OrderBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rent_asc" => Ok(OrderBy::RentAsc),
            "rent_desc" => Ok(OrderBy::RentDesc),
            "date_desc" => Ok(OrderBy::DateDesc),
            "date_asc" => Ok(OrderBy::DateAsc),
            _ => Err(()),
        }
    }
}

impl OrderBy {
    pub const VARIANTS: &'static [&'static str] = &["rent_asc", "rent_desc", "date_desc", "date_asc"];

    /// YGL `sort_name` parameter.
    pub fn sort_name(&self) -> &'static str {
        match self {
            OrderBy::RentAsc | OrderBy::RentDesc => "rent",
            OrderBy::DateAsc | OrderBy::DateDesc => "avail_date",
        }
    }

    /// YGL `sort_dir` parameter.
    pub fn sort_dir(&self) -> &'static str {
        match self {
            OrderBy::RentAsc | OrderBy::DateAsc => "asc",
            OrderBy::RentDesc | OrderBy::DateDesc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paging {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE as u32,
            page_size: DEFAULT_PAGE_SIZE as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalSearch {
    pub beds_min: Option<u32>,
    pub beds_max: Option<u32>,
    pub baths_min: Option<f64>,
    pub baths_max: Option<f64>,
    pub rent_min: Option<u32>,
    pub rent_max: Option<u32>,
    pub neighborhoods: Vec<String>,
    pub availability_start: Option<NaiveDate>,
    pub availability_end: Option<NaiveDate>,
    pub fee: Option<Fee>,
    pub keyword: Option<String>,
    pub order_by: Option<OrderBy>,
    pub include_photos: bool,
    #[serde(flatten)]
    pub paging: Paging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSearch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub active_only: bool,
    #[serde(flatten)]
    pub paging: Paging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandlordSearch {
    pub landlord_ids: Vec<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    #[serde(flatten)]
    pub paging: Paging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: String,
}
