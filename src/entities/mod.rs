pub mod prelude;

pub mod last_update;
pub mod scene_exceptions;
pub mod search_templates;
pub mod tv_shows;
