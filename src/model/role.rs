use crate::model::user::{StaffRole, User};

/// Access role carried inside a token. Staff accounts are split by their
/// approval authority so the workflow can be gated without a lookup.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Student = 1,
    Tutor = 2,
    Hod = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Student),
            2 => Some(Role::Tutor),
            3 => Some(Role::Hod),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn for_user(user: &User) -> Self {
        match user {
            User::Student(_) => Role::Student,
            User::Staff(staff) => match staff.staff_role {
                StaffRole::Tutor => Role::Tutor,
                StaffRole::Hod => Role::Hod,
            },
        }
    }

    /// Approval authority, if this role belongs to a staff member.
    pub fn staff_role(self) -> Option<StaffRole> {
        match self {
            Role::Student => None,
            Role::Tutor => Some(StaffRole::Tutor),
            Role::Hod => Some(StaffRole::Hod),
        }
    }
}
