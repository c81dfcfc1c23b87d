//! SCIM wire models.

pub mod scim_response;
pub mod scim_user;

pub use scim_response::{
    ScimListResponse, ScimPagination, ScimPatchOp, ScimPatchRequest, ScimUserListResponse,
};
pub use scim_user::{ScimMeta, USER_SCHEMA};
