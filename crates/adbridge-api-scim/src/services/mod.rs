//! SCIM services: filter parsing, patch application, attribute mapping,
//! and the request processor.

pub mod attribute_mapper;
pub mod filter_parser;
pub mod patch;
pub mod user_service;

pub use user_service::UserService;
