pub mod completion;
pub mod document;
pub mod grammar;
pub mod position;
pub mod shader;
pub mod shader_error;
pub mod shader_language;
pub mod symbols;
