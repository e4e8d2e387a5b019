use std::path::Path;

use crate::error::ServiceError;

pub trait StorageApi {
    fn list_buckets(&self) -> Result<Vec<String>, ServiceError>;

    fn create_bucket(&self, name: &str) -> Result<(), ServiceError>;

    /// Uploads a local file, replacing any object already at `key`.
    fn put_object(&self, bucket: &str, key: &str, file: &Path) -> Result<(), ServiceError>;

    /// Succeeds when the key is absent; a missing bucket is `NotFound`.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ServiceError>;

    fn delete_bucket(&self, name: &str) -> Result<(), ServiceError>;
}
