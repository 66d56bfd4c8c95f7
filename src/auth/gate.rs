use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Owner-only mutation check. The privileged-tier flag grants nothing here.
pub fn can_mutate(acting_user: Uuid, resource_owner: Uuid) -> Decision {
    if acting_user == resource_owner {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
