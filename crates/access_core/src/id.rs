//! Validation shared by every string-carried identifier newtype
//! (`UserId`, `GroupId`, `EntityType`, `Entity` in `access_domain`).

/// Error returned when a candidate identifier string is empty or
/// whitespace-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("identifier must be non-empty and not whitespace-only")]
pub struct BlankIdentifier;

/// Rejects empty or whitespace-only identifiers.
///
/// Every string-carried id in this engine (user, group, entity type, entity)
/// is required by the data model to be "non-empty, non-whitespace"; this is
/// the one place that rule is enforced so newtype constructors can't drift
/// apart.
pub fn validate_identifier(s: &str) -> Result<(), BlankIdentifier> {
    if s.trim().is_empty() {
        Err(BlankIdentifier)
    } else {
        Ok(())
    }
}
