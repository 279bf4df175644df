mod auth;
mod health_check;
mod tasks;
mod users;

pub use auth::{change_password, current_user, login, logout, refresh, register, session};
pub use health_check::health_check;
pub use tasks::{create_task, delete_task, get_task, list_tasks, update_task};
pub use users::get_account;
