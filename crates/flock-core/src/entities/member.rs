//! Member entity - a roster row consumed from the directory

/// A roster member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub address: String,
    pub name: String,
    pub is_admin: bool,
    pub active: bool,
}

impl Member {
    /// Create a new active Member
    pub fn new(address: String, name: String, is_admin: bool) -> Self {
        Self {
            address,
            name,
            is_admin,
            active: true,
        }
    }
}
