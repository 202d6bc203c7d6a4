pub mod conflict;
pub mod engine;
pub mod rules;
pub mod slots;
