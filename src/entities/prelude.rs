pub use super::last_update::Entity as LastUpdate;
pub use super::scene_exceptions::Entity as SceneExceptions;
pub use super::search_templates::Entity as SearchTemplates;
pub use super::tv_shows::Entity as TvShows;
