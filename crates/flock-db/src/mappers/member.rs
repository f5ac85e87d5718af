//! Member entity <-> model mapper

use flock_core::entities::Member;

use crate::models::MemberModel;

/// Convert MemberModel to Member entity
impl From<MemberModel> for Member {
    fn from(model: MemberModel) -> Self {
        Member {
            address: model.address,
            name: model.name,
            is_admin: model.is_admin,
            active: model.active,
        }
    }
}
