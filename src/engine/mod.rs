pub mod timeline;
pub mod transitions;
