// handlers/elevated/root/tenant/mod.rs - tenant lifecycle for master admins

pub mod create; // POST   /api/root/tenants
pub mod delete; // DELETE /api/root/tenants/:id
pub mod list; // GET    /api/root/tenants
pub mod restore; // POST   /api/root/tenants/:id/restore
pub mod show; // GET    /api/root/tenants/:id
pub mod update; // PATCH  /api/root/tenants/:id

pub use create::tenant_create;
pub use delete::tenant_delete;
pub use list::tenant_list;
pub use restore::tenant_restore;
pub use show::tenant_show;
pub use update::tenant_update;
