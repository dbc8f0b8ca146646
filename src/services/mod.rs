//! Asset storage: validation, naming, backend selection and the two backends
//! behind the `StorageService` facade.

pub mod backend;
pub mod blob_backend;
pub mod local_backend;
pub mod naming;
pub mod storage_service;
pub mod validation;
