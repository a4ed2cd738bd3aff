use tracing::warn;

use super::Dashboard;
use crate::domain::Order;

/// New-order form. Creation failures show up as the form's message.
#[derive(Debug, Default, Clone)]
pub struct OrderForm {
    pub name: String,
    loading: bool,
    error: Option<String>,
}

impl OrderForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Creates the order. The name input is cleared on success.
    pub async fn submit(&mut self, dashboard: &Dashboard) -> Option<Order> {
        self.error = None;
        self.loading = true;
        let result = dashboard.add_order(&self.name).await;
        self.loading = false;

        match result {
            Ok(order) => {
                self.name.clear();
                Some(order)
            }
            Err(e) => {
                warn!(error = %e, "Order form submission failed");
                self.error = Some(e.to_string());
                None
            }
        }
    }
}
