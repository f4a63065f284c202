mod add;
mod pause;
mod remove;
mod shows;
mod templates;
mod update;

pub use add::{AddShowArgs, cmd_add_show};
pub use pause::cmd_pause_show;
pub use remove::cmd_remove_show;
pub use shows::cmd_list_shows;
pub use templates::cmd_templates;
pub use update::cmd_update;
