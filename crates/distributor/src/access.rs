//! Admin capability for the sweep path.
//!
//! Who the admin is, and how that changes, belongs to the access-control
//! collaborator. The distributor only ever asks for the current value.

use merkledrop_core::Address;
use parking_lot::RwLock;
use tracing::info;

pub trait AdminAuthority: Send + Sync {
    fn current_admin(&self) -> Address;
}

/// Admin that never changes
#[derive(Debug, Clone, Copy)]
pub struct FixedAdmin(pub Address);

impl AdminAuthority for FixedAdmin {
    fn current_admin(&self) -> Address {
        self.0
    }
}

/// Admin that can be rotated by whoever holds the handle
#[derive(Debug)]
pub struct SharedAdmin {
    admin: RwLock<Address>,
}

impl SharedAdmin {
    pub fn new(admin: Address) -> Self {
        Self {
            admin: RwLock::new(admin),
        }
    }

    pub fn rotate(&self, new_admin: Address) {
        let mut admin = self.admin.write();
        info!("Admin rotated from {} to {}", *admin, new_admin);
        *admin = new_admin;
    }
}

impl AdminAuthority for SharedAdmin {
    fn current_admin(&self) -> Address {
        *self.admin.read()
    }
}
