pub mod audit;
pub mod auth;
pub mod error;
pub mod reconcile;

use muster_db::DbPool;
use reconcile::ReconcilePolicy;

/// Bit flag: principal is a platform admin.
pub const USER_FLAG_ADMIN: i32 = 1 << 0;

pub fn is_admin(flags: i32) -> bool {
    flags & USER_FLAG_ADMIN != 0
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    /// How audit snapshots are read when building change reports.
    pub reconcile: ReconcilePolicy,
}
