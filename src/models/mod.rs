pub mod command_template;
pub mod error;
pub mod history;
pub mod placeholder;
pub mod recipient;
