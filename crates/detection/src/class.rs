//! Coastal object classes

use serde::{Deserialize, Serialize};

/// Object class emitted by the coastal detector.
///
/// Ids match the order the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    FishingBoat,
    MerchantShip,
    Warship,
    Person,
    Tanker,
}

impl ObjectClass {
    /// All classes in id order
    pub const ALL: [ObjectClass; 5] = [
        ObjectClass::FishingBoat,
        ObjectClass::MerchantShip,
        ObjectClass::Warship,
        ObjectClass::Person,
        ObjectClass::Tanker,
    ];

    /// Resolve a detector class id
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Detector class id
    pub fn id(&self) -> u32 {
        *self as u32
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::FishingBoat => "fishing_boat",
            ObjectClass::MerchantShip => "merchant_ship",
            ObjectClass::Warship => "warship",
            ObjectClass::Person => "person",
            ObjectClass::Tanker => "tanker",
        }
    }

    /// Korean label, as written by older detection logs and annotation sets
    pub fn korean_label(&self) -> &'static str {
        match self {
            ObjectClass::FishingBoat => "어선",
            ObjectClass::MerchantShip => "상선",
            ObjectClass::Warship => "군함",
            ObjectClass::Person => "사람",
            ObjectClass::Tanker => "유조류",
        }
    }

    /// Classes that escalate to an alert when seen at close range
    pub fn is_high_risk(&self) -> bool {
        matches!(
            self,
            ObjectClass::FishingBoat | ObjectClass::Warship | ObjectClass::Person
        )
    }

    /// Resolve a class from its name or Korean label
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label || c.korean_label() == label)
    }

    /// Display name for a raw class id, synthesizing one for unknown ids
    pub fn name_for_id(id: u32) -> String {
        match Self::from_id(id) {
            Some(class) => class.as_str().to_string(),
            None => format!("unknown_{}", id),
        }
    }
}

impl std::fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
