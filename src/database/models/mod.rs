pub mod activity;
pub mod document;
pub mod folder;
pub mod notification;
pub mod tenant;
pub mod user;

pub use activity::ActivityRecord;
pub use document::Document;
pub use folder::{Folder, FolderCrumb};
pub use notification::Notification;
pub use tenant::Tenant;
pub use user::User;
