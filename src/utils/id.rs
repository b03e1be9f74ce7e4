use uuid::Uuid;

/// Generate a random container identity
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_is_valid() {
        let id = generate_uuid();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(id.len(), 36);
    }

    #[test]
    fn test_uuid_uniqueness() {
        assert_ne!(generate_uuid(), generate_uuid());
    }
}
