use crate::error::ServiceError;

pub trait IdentityApi {
    /// ARN of the named role, or `None` when it does not exist.
    fn get_role(&self, name: &str) -> Result<Option<String>, ServiceError>;

    /// Creates the role and returns its ARN.
    fn create_role(
        &self,
        name: &str,
        description: &str,
        trust_policy: &str,
    ) -> Result<String, ServiceError>;

    fn delete_role(&self, name: &str) -> Result<(), ServiceError>;
}
