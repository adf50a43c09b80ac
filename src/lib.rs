pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod render {
    pub mod compositor;
    pub mod loader;
    pub mod viewer;
}
pub mod scan;
pub mod selector;
#[doc(hidden)]
pub mod testkit;
pub mod timer;
