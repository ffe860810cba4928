//! Core data model types: documents, message properties, attachments, and bodies.

pub mod attachment;
pub mod document;
pub mod message;
pub mod property;
