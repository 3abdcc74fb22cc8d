pub mod storage;
pub mod store;
pub mod verification;

pub use storage::{object_key, DocumentStore, RestDocumentStore, StorageError};
pub use store::RestApplicationStore;
pub use verification::{
    DocumentPayload, IdentityCheck, LicenseCheck, RestVerificationGateway, VerificationError,
    VerificationGateway,
};
