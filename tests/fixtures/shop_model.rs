use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// A page of results
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total number of items
    pub total: u64,
}

/// A customer order
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order id
    pub id: i64,
    /// Name shown to the customer
    /// @mock Spring order
    pub display_name: String,
    /// Free-form labels
    pub tags: Vec<String>,
    /// Current status
    pub status: OrderStatus,
    /// Who placed the order
    pub customer: Customer,
    #[serde(skip_serializing)]
    pub internal_note: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Still open
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Customer {
    /// Full name
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Contact address
    pub email: String,
    /// @ignore
    pub password_hash: String,
    /// Customer who referred this one
    pub referrer: Option<Box<Customer>>,
}

/// Orders of one region, with the paging fields inlined
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderPage {
    /// Sales region
    pub region: String,
    #[serde(flatten)]
    pub page: Page<Order>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignUp {
    /// Login name
    #[validate(required)]
    pub username: String,
    /// Display nickname
    /// @required
    /// @since 1.2
    pub nickname: String,
    /// Profile picture
    pub avatar: Bytes,
    /// Extra attributes by numeric code
    pub attributes: HashMap<u32, String>,
    /// Default shipping address
    pub address: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Address {
    /// City name
    pub city: String,
    /// Postal code
    pub zip: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Node {
    pub value: i32,
    pub next: Option<Box<Node>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub manager: Department,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Department {
    pub title: String,
    pub head: Box<Employee>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Metrics {
    /// Counters by numeric code
    pub counters: HashMap<u32, String>,
}
