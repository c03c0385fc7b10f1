//! Attribute types: the tags a dive can carry.

use serde::{Deserialize, Serialize};

/// Attribute types present on a freshly initialised log, in id order from 0.
pub const DEFAULT_ATTRIBUTE_TYPES: [&str; 10] = [
    "Boat",
    "Shore",
    "Drift",
    "Night",
    "Cave",
    "Wreck",
    "Decompression",
    "Nitrox",
    "Freshwater",
    "Dive Course",
];

/// Longest allowed attribute name.
pub const ATTRIBUTE_NAME_MAX: usize = 30;

/// A kind of tag that can be attached to dives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeType {
    pub id: i64,
    pub name: String,
}

/// Request body for adding an attribute type to the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttributeRequest {
    pub name: String,
}
