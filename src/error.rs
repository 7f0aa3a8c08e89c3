/// Scene construction error
#[derive(Debug, Clone)]
pub struct SceneError {
    pub message: String,
    pub phase: &'static str,
}

impl SceneError {
    pub fn new(phase: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase,
        }
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.phase, self.message)
    }
}

impl std::error::Error for SceneError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_phase() {
        let e = SceneError::new("viewport", "zero-sized canvas 0x600");
        assert_eq!(e.to_string(), "[viewport] zero-sized canvas 0x600");
    }
}
