pub mod search_template;
pub mod show;

pub use search_template::{SearchTemplate, TemplateInput};
pub use show::{ALL_SEASONS, AliasException, Show, ShowKind};
