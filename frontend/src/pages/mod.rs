pub mod locations;
pub mod timeline;
