// SmartMarks services
// Services provide the outer surface: commands, identity, presentation, the HTTP
// backend, settings and logging.

pub mod commands;
pub mod identity;
pub mod logging;
pub mod presenter;
pub mod rest_store;
pub mod settings_engine;
