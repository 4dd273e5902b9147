//! Nation - owner of towns and source of starting endowments

use serde::{Deserialize, Serialize};

use crate::core::types::NationId;
use crate::goods::Property;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nation {
    pub id: NationId,
    pub name: String,
    pub adjective: String,
    /// Goods every traveler of this nation starts with
    pub endowment: Property,
}

impl Nation {
    pub fn new(id: NationId, name: impl Into<String>, adjective: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            adjective: adjective.into(),
            endowment: Property::new(),
        }
    }

    pub fn with_endowment(mut self, endowment: Property) -> Self {
        self.endowment = endowment;
        self
    }

    /// Carried property for a newly created traveler
    pub fn starting_property(&self) -> Property {
        self.endowment.clone()
    }
}
