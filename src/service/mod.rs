//! Image generation service boundary.
//!
//! [`ImageService`] is the seam between orchestration and the network: it
//! takes instruction text (and, for edits, the prior image) and returns raw
//! image bytes or a classified [`ServiceError`]. The production client is
//! [`GeminiService`]; tests script a mock.

pub mod gemini;

use crate::credentials::ApiKey;
use crate::geometry::AspectRatio;
use thiserror::Error;

pub use gemini::GeminiService;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service refused on content-policy grounds.
    #[error("Blocked by the service's safety filter{}", reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    SafetyBlocked { reason: Option<String> },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid image data: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ServiceError {
    pub fn is_safety_block(&self) -> bool {
        matches!(self, ServiceError::SafetyBlocked { .. })
    }
}

/// One generation call: the instruction plus the ratio it must honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub aspect: AspectRatio,
}

pub trait ImageService {
    fn generate(&self, key: &ApiKey, request: &GenerationRequest<'_>)
    -> Result<Vec<u8>, ServiceError>;

    /// The returned image replaces `image` wholesale.
    fn edit(&self, key: &ApiKey, image: &[u8], instruction: &str)
    -> Result<Vec<u8>, ServiceError>;

    /// Cheap liveness probe. Any failure, including network errors, is `false`.
    fn validate_key(&self, key: &ApiKey) -> bool;
}

/// Generation prompt with the ratio and full-bleed requirement restated last.
pub fn reinforce_generation_prompt(prompt: &str, aspect: AspectRatio) -> String {
    format!(
        "{prompt}\n\nCRITICAL REQUIREMENT: Generate the image with EXACTLY {aspect} aspect ratio. \
         The design MUST completely fill the entire canvas from edge to edge with no empty margins \
         or white space borders. Extend the artwork to touch all four edges of the image."
    )
}

/// Edit instruction with the line-art constraints restated.
pub fn reinforce_edit_instruction(instruction: &str) -> String {
    format!(
        "{instruction}\n\nIMPORTANT: The result must remain a black and white line art coloring \
         page with pure black outlines on white background. No shading, no gradients, no colors. \
         Maintain the exact same aspect ratio and ensure the design fills the entire canvas."
    )
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted service: each call pops the next queued result and records
    /// what it was asked.
    #[derive(Default)]
    pub struct MockService {
        pub generate_results: Mutex<VecDeque<Result<Vec<u8>, ServiceError>>>,
        pub edit_results: Mutex<VecDeque<Result<Vec<u8>, ServiceError>>>,
        pub key_valid: bool,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedCall {
        Generate { prompt: String, aspect: String },
        Edit { image: Vec<u8>, instruction: String },
        Validate,
    }

    impl MockService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_generate(results: Vec<Result<Vec<u8>, ServiceError>>) -> Self {
            Self {
                generate_results: Mutex::new(results.into()),
                ..Self::default()
            }
        }

        pub fn with_edit(results: Vec<Result<Vec<u8>, ServiceError>>) -> Self {
            Self {
                edit_results: Mutex::new(results.into()),
                ..Self::default()
            }
        }

        pub fn push_generate(&self, result: Result<Vec<u8>, ServiceError>) {
            self.generate_results.lock().unwrap().push_back(result);
        }

        pub fn push_edit(&self, result: Result<Vec<u8>, ServiceError>) {
            self.edit_results.lock().unwrap().push_back(result);
        }

        pub fn get_calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    pub fn safety_block() -> ServiceError {
        ServiceError::SafetyBlocked {
            reason: Some("SAFETY".into()),
        }
    }

    pub fn generic_failure() -> ServiceError {
        ServiceError::UnexpectedResponse("no candidates".into())
    }

    impl ImageService for MockService {
        fn generate(
            &self,
            _key: &ApiKey,
            request: &GenerationRequest<'_>,
        ) -> Result<Vec<u8>, ServiceError> {
            self.calls.lock().unwrap().push(RecordedCall::Generate {
                prompt: request.prompt.to_string(),
                aspect: request.aspect.to_string(),
            });
            self.generate_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(generic_failure()))
        }

        fn edit(
            &self,
            _key: &ApiKey,
            image: &[u8],
            instruction: &str,
        ) -> Result<Vec<u8>, ServiceError> {
            self.calls.lock().unwrap().push(RecordedCall::Edit {
                image: image.to_vec(),
                instruction: instruction.to_string(),
            });
            self.edit_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(generic_failure()))
        }

        fn validate_key(&self, _key: &ApiKey) -> bool {
            self.calls.lock().unwrap().push(RecordedCall::Validate);
            self.key_valid
        }
    }

    #[test]
    fn generation_reinforcement_restates_ratio() {
        let text = reinforce_generation_prompt("Draw owls.", AspectRatio::new(140, 297));
        assert!(text.starts_with("Draw owls.\n\n"));
        assert!(text.contains("EXACTLY 140:297 aspect ratio"));
        assert!(text.contains("all four edges"));
    }

    #[test]
    fn edit_reinforcement_keeps_line_art() {
        let text = reinforce_edit_instruction("Simplify.");
        assert!(text.starts_with("Simplify.\n\n"));
        assert!(text.contains("black and white line art"));
        assert!(text.contains("same aspect ratio"));
    }

    #[test]
    fn safety_block_is_classified() {
        assert!(safety_block().is_safety_block());
        assert!(!generic_failure().is_safety_block());
        assert_eq!(
            safety_block().to_string(),
            "Blocked by the service's safety filter (SAFETY)"
        );
    }

    #[test]
    fn mock_replays_script_in_order() {
        let key = ApiKey::new("test-key-123456").unwrap();
        let service = MockService::with_generate(vec![Ok(vec![1]), Err(safety_block())]);
        let request = GenerationRequest {
            prompt: "p",
            aspect: AspectRatio::new(1, 1),
        };
        assert_eq!(service.generate(&key, &request).unwrap(), vec![1]);
        assert!(service.generate(&key, &request).unwrap_err().is_safety_block());
        // Script exhausted
        assert!(!service.generate(&key, &request).unwrap_err().is_safety_block());
        assert_eq!(service.get_calls().len(), 3);
    }
}
