use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path id, rejecting anything that is not a UUID
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest(format!("Invalid id format: {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_uuid_and_rejects_garbage() {
        let id = Uuid::new_v4();
        assert_eq!(valid_uuid(&id.to_string()).unwrap(), id);
        assert!(matches!(valid_uuid("session-1"), Err(AppError::BadRequest(_))));
    }
}
