pub mod last_update;
pub mod scene_exception;
pub mod search_template;
pub mod tv_show;
