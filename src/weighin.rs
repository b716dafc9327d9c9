pub mod form;
pub mod record;
pub mod schema;
pub mod screen;
pub mod submit;
