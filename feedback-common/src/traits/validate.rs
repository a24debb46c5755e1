// File: feedback-common/src/traits/validate.rs

/// Structural checks run on every decoded API payload before it is handed
/// to callers. Deserialization already guarantees the shape; this catches
/// values that parse but are out of range (a rating of 9, an empty slug).
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        for (idx, item) in self.iter().enumerate() {
            item.validate().map_err(|e| format!("[{idx}]: {e}"))?;
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), String> {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }
}

impl Validate for serde_json::Value {}
impl Validate for () {}
