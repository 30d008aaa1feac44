//! Hit value objects: each renders its own query-string fragment.
//!
//! Values are emitted verbatim, without URL-encoding; callers supply
//! URL-safe strings.

/// A trackable interaction that contributes its own query-string fragment,
/// e.g. `t=screenview&cd=Home`.
pub trait Hit: Send + Sync {
    fn to_query_string(&self) -> String;
}

/// A screen view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenHit {
    screen_name: String,
}

impl ScreenHit {
    pub fn new(screen_name: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
        }
    }
}

impl Hit for ScreenHit {
    fn to_query_string(&self) -> String {
        format!("t=screenview&cd={}", self.screen_name)
    }
}

/// A page view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageHit {
    page_name: String,
}

impl PageHit {
    pub fn new(page_name: impl Into<String>) -> Self {
        Self {
            page_name: page_name.into(),
        }
    }
}

impl Hit for PageHit {
    fn to_query_string(&self) -> String {
        format!("t=pageview&dp={}", self.page_name)
    }
}

/// A custom event with category and action, plus optional label and value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    category: String,
    action: String,
    label: Option<String>,
    value: Option<i64>,
}

impl Event {
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: None,
            value: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }
}

impl Hit for Event {
    fn to_query_string(&self) -> String {
        let mut fragment = format!("t=event&ec={}&ea={}", self.category, self.action);
        if let Some(label) = &self.label {
            fragment.push_str(&format!("&el={label}"));
        }
        if let Some(value) = self.value {
            fragment.push_str(&format!("&ev={value}"));
        }
        fragment
    }
}

/// An ecommerce transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    transaction_id: String,
    affiliation: Option<String>,
    revenue: Option<f64>,
    shipping: Option<f64>,
}

impl Transaction {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            affiliation: None,
            revenue: None,
            shipping: None,
        }
    }

    /// The store or affiliation the transaction occurred in.
    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    /// Grand total, including shipping and tax.
    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn with_shipping(mut self, shipping: f64) -> Self {
        self.shipping = Some(shipping);
        self
    }
}

impl Hit for Transaction {
    fn to_query_string(&self) -> String {
        let mut fragment = format!("t=transaction&ti={}", self.transaction_id);
        if let Some(affiliation) = &self.affiliation {
            fragment.push_str(&format!("&ta={affiliation}"));
        }
        if let Some(revenue) = self.revenue {
            fragment.push_str(&format!("&tr={revenue}"));
        }
        if let Some(shipping) = self.shipping {
            fragment.push_str(&format!("&tt={shipping}"));
        }
        fragment
    }
}

/// A line item belonging to an ecommerce transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct AddItem {
    transaction_id: String,
    name: String,
    price: Option<f64>,
    quantity: Option<u32>,
    sku: Option<String>,
    category: Option<String>,
}

impl AddItem {
    pub fn new(transaction_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            name: name.into(),
            price: None,
            quantity: None,
            sku: None,
            category: None,
        }
    }

    /// Unit price for each item.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Units purchased; the endpoint rounds non-integer quantities.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl Hit for AddItem {
    fn to_query_string(&self) -> String {
        let mut fragment = format!("t=item&ti={}&in={}", self.transaction_id, self.name);
        if let Some(price) = self.price {
            fragment.push_str(&format!("&ip={price}"));
        }
        if let Some(quantity) = self.quantity {
            fragment.push_str(&format!("&iq={quantity}"));
        }
        if let Some(sku) = &self.sku {
            fragment.push_str(&format!("&ic={sku}"));
        }
        if let Some(category) = &self.category {
            fragment.push_str(&format!("&iv={category}"));
        }
        fragment
    }
}
