// ── Feed controllers ──
//
// Each controller owns a handful of `State` stores and the logic that keeps
// them consistent. Renderers only read and subscribe; they change things
// through the controller's methods.

mod command;
mod posts;
mod users;

pub use command::PostsCommand;
pub use posts::PostsController;
pub use users::UsersController;
