//! Role assignment from slot order and policy.

use rand::Rng;
use rand::seq::SliceRandom;
use shadowhunt_protocol::Role;

use crate::config::RolePolicy;

/// Roles for `count` participants in slot order.
///
/// Deterministic for a given policy and RNG state. Pinned policies put the
/// host in slot 0 and give everyone else the other role.
pub fn assign_roles<R: Rng + ?Sized>(
    policy: RolePolicy,
    count: usize,
    guardian_count: usize,
    rng: &mut R,
) -> Vec<Role> {
    match policy {
        RolePolicy::HostIsGuardian => pinned(Role::Guardian, count),
        RolePolicy::HostIsShadow => pinned(Role::Shadow, count),
        RolePolicy::Random => {
            let guardians = if count < 2 {
                count
            } else {
                guardian_count.clamp(1, count - 1)
            };
            let mut roles = vec![Role::Guardian; guardians];
            roles.resize(count, Role::Shadow);
            roles.shuffle(rng);
            roles
        }
    }
}

fn pinned(host: Role, count: usize) -> Vec<Role> {
    let mut roles = Vec::with_capacity(count);
    if count > 0 {
        roles.push(host);
        roles.resize(count, host.complement());
    }
    roles
}
