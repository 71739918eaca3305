pub mod compiler;
pub mod document;
pub mod functions;
pub mod parse;
pub mod settings;
