use serde::{Deserialize, Serialize};

use crate::board::SquareId;
use crate::game::players::PlayerId;
use crate::types::PropertyKind;

/// Houses on a square; five means a hotel.
pub const MAX_DEVELOPMENT: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: SquareId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PropertyKind,
    #[serde(default)]
    pub price: Option<u32>,
    #[serde(default)]
    pub rent_site_only: u32,
    #[serde(default)]
    pub rent_hotel: u32,
    #[serde(default)]
    pub cost_of_house: u32,
    #[serde(default)]
    pub color: String,
}

impl PropertyRecord {
    pub fn land(id: SquareId, name: &str, price: u32, base_rent: u32, color: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: PropertyKind::Property,
            price: Some(price),
            rent_site_only: base_rent,
            rent_hotel: 0,
            cost_of_house: 0,
            color: color.to_string(),
        }
    }

    pub fn special(
        id: SquareId,
        name: &str,
        price: u32,
        base_rent: u32,
        kind: PropertyKind,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            price: Some(price),
            rent_site_only: base_rent,
            rent_hotel: 0,
            cost_of_house: 0,
            color: kind.to_string(),
        }
    }

    pub fn with_development_costs(mut self, rent_hotel: u32, cost_of_house: u32) -> Self {
        self.rent_hotel = rent_hotel;
        self.cost_of_house = cost_of_house;
        self
    }

    /// Price, treating a zero price like a missing one.
    pub fn listed_price(&self) -> Option<u32> {
        self.price.filter(|price| *price > 0)
    }

    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("square {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// Links a property to the wallet that currently holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    #[serde(default)]
    pub id: Option<u64>,
    pub property_id: SquareId,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub mortgaged: bool,
    #[serde(default)]
    pub development: u8,
}

impl OwnershipRecord {
    pub fn new(property_id: SquareId, address: impl Into<String>) -> Self {
        Self {
            id: None,
            property_id,
            address: Some(address.into()),
            player_id: None,
            mortgaged: false,
            development: 0,
        }
    }

    pub fn mortgaged(mut self) -> Self {
        self.mortgaged = true;
        self
    }

    pub fn with_development(mut self, development: u8) -> Self {
        self.development = development.min(MAX_DEVELOPMENT);
        self
    }

    pub fn is_owned_by(&self, address: &str) -> bool {
        match &self.address {
            Some(owner) => !address.is_empty() && owner.eq_ignore_ascii_case(address),
            None => false,
        }
    }

    /// Held by some wallet other than `address`.
    pub fn is_held_by_other(&self, address: &str) -> bool {
        match &self.address {
            Some(owner) => !owner.is_empty() && !owner.eq_ignore_ascii_case(address),
            None => false,
        }
    }
}

/// First ownership record for `property_id`, mirroring the service's one-row-per-property model.
pub fn ownership_of(ownerships: &[OwnershipRecord], property_id: SquareId) -> Option<&OwnershipRecord> {
    ownerships.iter().find(|o| o.property_id == property_id)
}

pub fn find_property(properties: &[PropertyRecord], id: SquareId) -> Option<&PropertyRecord> {
    properties.iter().find(|p| p.id == id)
}
