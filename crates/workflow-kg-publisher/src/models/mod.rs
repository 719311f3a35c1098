//! Data models: answers, entity references, claims, citations.

mod answers;
mod citation;
mod entity;

pub use answers::{
    AnswerMap, ExportTarget, OperationMode, WorkflowKind, keys, publish_requested,
};
pub use citation::{Citation, Contributor};
pub use entity::{
    Claim, ClaimKind, EntityCandidate, EntityReference, ItemId, Origin, PropertyId, ResolvedEntity,
    PORTAL_PREFIX, TBD, WIKIDATA_PREFIX,
};
